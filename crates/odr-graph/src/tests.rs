//! Unit tests for odr-graph.

#[cfg(test)]
mod nodes {
    use odr_core::Point;

    use crate::NodeStore;

    #[test]
    fn insert_once() {
        let mut store = NodeStore::new();
        assert!(store.insert("a", Point::new(0.0, 0.0)));
        assert!(!store.insert("a", Point::new(5.0, 5.0)));
        // first position wins
        assert_eq!(store.retrieve("a").unwrap().pos.x, 0.0);
    }

    #[test]
    fn get_or_insert_first_wins() {
        let mut store = NodeStore::new();
        store.get_or_insert("n", Point::new(1.0, 2.0));
        let n = store.get_or_insert("n", Point::new(9.0, 9.0));
        assert_eq!(n.pos.y, 2.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn nearest_query() {
        let mut store = NodeStore::new();
        store.insert("west", Point::new(0.0, 0.0));
        store.insert("east", Point::new(100.0, 0.0));
        let idx = store.spatial_index();
        assert_eq!(idx.nearest(Point::new(10.0, 5.0)), Some("west"));
        assert_eq!(idx.nearest(Point::new(90.0, -5.0)), Some("east"));
    }

    #[test]
    fn nearest_on_empty() {
        let store = NodeStore::new();
        assert!(store.spatial_index().nearest(Point::new(0.0, 0.0)).is_none());
    }
}

#[cfg(test)]
mod edges {
    use odr_core::{LaneTypeCatalog, Point, PolyLine, VehClasses};

    use crate::{EdgeLane, EdgeStore, LaneConnection, RoadEdge};

    fn edge(id: &str) -> RoadEdge {
        RoadEdge {
            id: id.to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            geometry: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]
                .into_iter()
                .collect::<PolyLine>(),
            lanes: vec![EdgeLane::default()],
            type_name: "driving".to_string(),
            priority: 1,
            street_name: String::new(),
            orig_road: id.to_string(),
        }
    }

    #[test]
    fn insert_and_retrieve() {
        let cat = LaneTypeCatalog::with_defaults();
        let mut store = EdgeStore::new();
        assert!(store.insert(edge("-1"), false, &cat));
        assert!(!store.insert(edge("-1"), false, &cat));
        assert_eq!(store.retrieve("-1").unwrap().lane_count(), 1);
    }

    #[test]
    fn forbidden_edge_is_ignored() {
        let cat = LaneTypeCatalog::with_defaults();
        let mut store = EdgeStore::new();
        let mut e = edge("x");
        e.lanes[0].permissions = VehClasses::NONE;
        assert!(store.insert(e, false, &cat));
        assert!(store.was_ignored("x"));
        assert!(store.retrieve("x").is_none());
    }

    #[test]
    fn keep_all_overrides_filter() {
        let cat = LaneTypeCatalog::with_defaults();
        let mut store = EdgeStore::new();
        let mut e = edge("x");
        e.lanes[0].permissions = VehClasses::NONE;
        assert!(store.insert(e, true, &cat));
        assert!(!store.was_ignored("x"));
        assert!(store.contains("x"));
    }

    #[test]
    fn connections_from_filters() {
        let cat = LaneTypeCatalog::with_defaults();
        let mut store = EdgeStore::new();
        store.insert(edge("a"), false, &cat);
        store.insert(edge("b"), false, &cat);
        store.add_connection(LaneConnection {
            from_edge: "a".to_string(),
            from_lane: 0,
            to_edge: "b".to_string(),
            to_lane: 0,
            shape: None,
            orig: None,
        });
        store.add_connection(LaneConnection {
            from_edge: "b".to_string(),
            from_lane: 0,
            to_edge: "a".to_string(),
            to_lane: 0,
            shape: None,
            orig: None,
        });
        assert_eq!(store.connections_from("a").count(), 1);
        assert_eq!(store.connections().len(), 2);
    }
}
