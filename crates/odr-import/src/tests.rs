//! Unit tests for odr-import.
//!
//! All tests drive the pipeline with literal OpenDRIVE documents; no test
//! needs a file on disk.

#[cfg(test)]
mod helpers {
    use odr_core::{CollectingObserver, IdentityProjection, ImportConfig, LaneTypeCatalog};

    use crate::{import_str, ImportOutput};

    /// Run the full pipeline with default settings.
    pub fn import(xml: &str) -> (ImportOutput, CollectingObserver) {
        import_with(xml, ImportConfig::default())
    }

    /// Run the full pipeline with a custom configuration.
    pub fn import_with(xml: &str, cfg: ImportConfig) -> (ImportOutput, CollectingObserver) {
        let catalog = LaneTypeCatalog::with_defaults();
        let mut obs = CollectingObserver::new();
        let out = import_str(xml, &catalog, &cfg, &IdentityProjection, &mut obs)
            .expect("import should not abort");
        (out, obs)
    }

    /// A 100 m straight road with one driving lane per side.
    pub const STRAIGHT: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <header revMajor="1" revMinor="2"/>
  <road id="R" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <left>
          <lane id="1" type="driving"><width sOffset="0" a="3.5" b="0" c="0" d="0"/></lane>
        </left>
        <center>
          <lane id="0" type="none"/>
        </center>
        <right>
          <lane id="-1" type="driving"><width sOffset="0" a="3.5" b="0" c="0" d="0"/></lane>
        </right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
}

// ── Scenario: straight road, one section ──────────────────────────────────────

#[cfg(test)]
mod straight_road {
    use super::helpers::{import, STRAIGHT};

    #[test]
    fn emits_both_directions() {
        let (out, _) = import(STRAIGHT);
        assert_eq!(out.edges.len(), 2);
        let forward = out.edges.retrieve("-R").expect("forward edge");
        let backward = out.edges.retrieve("R").expect("backward edge");
        assert_eq!(forward.lane_count(), 1);
        assert_eq!(backward.lane_count(), 1);
    }

    #[test]
    fn endpoint_nodes_are_synthesized() {
        let (out, _) = import(STRAIGHT);
        assert!(out.nodes.contains("R.begin"));
        assert!(out.nodes.contains("R.end"));
        let forward = out.edges.retrieve("-R").unwrap();
        assert_eq!(forward.from, "R.begin");
        assert_eq!(forward.to, "R.end");
        let backward = out.edges.retrieve("R").unwrap();
        assert_eq!(backward.from, "R.end");
        assert_eq!(backward.to, "R.begin");
    }

    #[test]
    fn geometry_spans_the_road() {
        let (out, _) = import(STRAIGHT);
        let forward = out.edges.retrieve("-R").unwrap();
        assert_eq!(forward.geometry.len(), 2);
        assert!((forward.geometry[0].x - 0.0).abs() < 1e-9);
        assert!((forward.geometry[1].x - 100.0).abs() < 1e-9);
        // backward edge carries the same polyline reversed
        let backward = out.edges.retrieve("R").unwrap();
        assert!((backward.geometry[0].x - 100.0).abs() < 1e-9);
        assert!((backward.geometry[1].x - 0.0).abs() < 1e-9);
    }

    #[test]
    fn lane_attributes_resolved() {
        let (out, _) = import(STRAIGHT);
        let forward = out.edges.retrieve("-R").unwrap();
        let lane = &forward.lanes[0];
        assert!((lane.width - 3.5).abs() < 1e-9);
        assert!((lane.speed - 13.89).abs() < 1e-9); // type default
        assert_eq!(lane.orig_id.as_deref(), Some("R_-1"));
    }

    #[test]
    fn every_edge_is_wired_to_known_nodes() {
        let (out, _) = import(STRAIGHT);
        for edge in out.edges.iter() {
            assert!(edge.geometry.len() >= 2);
            assert!(out.nodes.contains(&edge.from), "missing {}", edge.from);
            assert!(out.nodes.contains(&edge.to), "missing {}", edge.to);
        }
    }
}

// ── Scenario: speed change splits sections ────────────────────────────────────

#[cfg(test)]
mod speed_split {
    use super::helpers::import;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="R" length="200.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="200"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane>
        </right>
      </laneSection>
      <laneSection s="30">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
            <speed sOffset="50" max="10"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;

    #[test]
    fn three_sections_emerge() {
        let (out, _) = import(XML);
        // section starts 0, 30, 80 → three forward edges
        assert!(out.edges.contains("-R.0.00"));
        assert!(out.edges.contains("-R.30.00"));
        assert!(out.edges.contains("-R.80.00"));
        assert_eq!(out.edges.len(), 3);
    }

    #[test]
    fn speeds_are_propagated() {
        let (out, _) = import(XML);
        // before the speed record: type default, after it: 10 m/s
        let before = out.edges.retrieve("-R.30.00").unwrap();
        assert!((before.lanes[0].speed - 13.89).abs() < 1e-9);
        let after = out.edges.retrieve("-R.80.00").unwrap();
        assert!((after.lanes[0].speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sections_are_stitched() {
        let (out, _) = import(XML);
        let stitched: Vec<_> = out
            .edges
            .connections()
            .iter()
            .map(|c| (c.from_edge.as_str(), c.to_edge.as_str()))
            .collect();
        assert!(stitched.contains(&("-R.0.00", "-R.30.00")));
        assert!(stitched.contains(&("-R.30.00", "-R.80.00")));
    }

    #[test]
    fn forward_geometries_concatenate_to_road_shape() {
        let (out, _) = import(XML);
        let mut whole: Vec<f64> = Vec::new();
        for id in ["-R.0.00", "-R.30.00", "-R.80.00"] {
            let edge = out.edges.retrieve(id).unwrap();
            for i in 0..edge.geometry.len() {
                if whole.last().map_or(true, |&x| (x - edge.geometry[i].x).abs() > 1e-6) {
                    whole.push(edge.geometry[i].x);
                }
            }
        }
        assert!((whole.first().unwrap() - 0.0).abs() < 1e-6);
        assert!((whole.last().unwrap() - 200.0).abs() < 1e-6);
        assert!(whole.windows(2).all(|w| w[0] < w[1]), "monotone: {whole:?}");
    }
}

// ── Scenario: junction via connecting road ────────────────────────────────────

#[cfg(test)]
mod junction_flattening {
    use super::helpers::import;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="A" length="100.0" junction="-1">
    <link><successor elementType="junction" elementId="J"/></link>
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
  <road id="X" length="10.0" junction="J">
    <link>
      <predecessor elementType="road" elementId="A" contactPoint="end"/>
      <successor elementType="road" elementId="B" contactPoint="start"/>
    </link>
    <planView>
      <geometry s="0" x="100" y="0" hdg="0" length="10"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/><successor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
  <road id="B" length="100.0" junction="-1">
    <link><predecessor elementType="junction" elementId="J"/></link>
    <planView>
      <geometry s="0" x="110" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
  <junction id="J">
    <connection id="0" incomingRoad="A" connectingRoad="X" contactPoint="start">
      <laneLink from="-1" to="-1"/>
    </connection>
  </junction>
</OpenDRIVE>"#;

    #[test]
    fn inner_road_emits_no_edge() {
        let (out, _) = import(XML);
        assert!(out.edges.contains("-A"));
        assert!(out.edges.contains("-B"));
        assert!(!out.edges.contains("-X"));
        assert!(!out.edges.contains("X"));
    }

    #[test]
    fn junction_node_attaches_outer_roads() {
        let (out, _) = import(XML);
        assert!(out.nodes.contains("J"));
        assert_eq!(out.edges.retrieve("-A").unwrap().to, "J");
        assert_eq!(out.edges.retrieve("-B").unwrap().from, "J");
    }

    #[test]
    fn one_direct_connection_through_the_junction() {
        let (out, _) = import(XML);
        let conns: Vec<_> = out
            .edges
            .connections()
            .iter()
            .filter(|c| c.from_edge == "-A")
            .collect();
        assert_eq!(conns.len(), 1);
        let c = conns[0];
        assert_eq!(c.to_edge, "-B");
        assert_eq!(c.from_lane, 0);
        assert_eq!(c.to_lane, 0);
        // original metadata records the connecting road
        assert_eq!(c.orig.as_ref().unwrap().0, "X");
    }

    #[test]
    fn no_connection_targets_an_inner_road() {
        let (out, _) = import(XML);
        for c in out.edges.connections() {
            assert!(out.edges.contains(&c.to_edge));
            assert!(out.edges.contains(&c.from_edge));
        }
    }

    #[test]
    fn lane_indices_stay_in_bounds() {
        let (out, _) = import(XML);
        for c in out.edges.connections() {
            let from = out.edges.retrieve(&c.from_edge).unwrap();
            let to = out.edges.retrieve(&c.to_edge).unwrap();
            assert!(c.from_lane < from.lane_count());
            assert!(c.to_lane < to.lane_count());
        }
    }
}

// ── Scenario: circular junction chains ────────────────────────────────────────

#[cfg(test)]
mod circular_junction {
    use super::helpers::import;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="A" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
  <road id="X" length="10.0" junction="J">
    <link><successor elementType="road" elementId="Y" contactPoint="start"/></link>
    <planView>
      <geometry s="0" x="100" y="0" hdg="0" length="10"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/><successor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
  <road id="Y" length="10.0" junction="J">
    <link><successor elementType="road" elementId="X" contactPoint="start"/></link>
    <planView>
      <geometry s="0" x="110" y="0" hdg="3.14159" length="10"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/><successor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
  <junction id="J">
    <connection id="0" incomingRoad="A" connectingRoad="X" contactPoint="start">
      <laneLink from="-1" to="-1"/>
    </connection>
  </junction>
</OpenDRIVE>"#;

    #[test]
    fn cycle_warns_and_emits_nothing() {
        let (out, obs) = import(XML);
        assert!(obs.has_warning("Circular connections"));
        // the walk through X↔Y never reaches an outer road
        assert!(out
            .edges
            .connections()
            .iter()
            .all(|c| c.from_edge != "-A"));
    }
}

// ── Scenario: narrow lane splitting and downgrade ─────────────────────────────

#[cfg(test)]
mod narrow_lane {
    use odr_core::{ImportConfig, VehClasses};

    use super::helpers::import_with;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="R" length="60.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="60"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <width sOffset="0" a="3.5" b="0" c="-0.0075" d="0"/>
            <width sOffset="20" a="0.5" b="0" c="0.0075" d="0"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;

    fn cfg() -> ImportConfig {
        ImportConfig {
            min_width: 2.0,
            ..ImportConfig::default()
        }
    }

    #[test]
    fn narrow_interval_is_bracketed() {
        let (out, _) = import_with(XML, cfg());
        // two splits bracket the thin stretch → three forward edges
        let forward: Vec<_> = out
            .edges
            .iter()
            .filter(|e| e.id.starts_with("-R"))
            .collect();
        assert_eq!(forward.len(), 3, "expected 3 sections, got {:?}",
            forward.iter().map(|e| &e.id).collect::<Vec<_>>());
    }

    #[test]
    fn thin_section_is_downgraded() {
        let (out, _) = import_with(XML, cfg());
        let mut downgraded = 0;
        let mut open = 0;
        for edge in out.edges.iter() {
            if !edge.id.starts_with("-R") {
                continue;
            }
            let lane = &edge.lanes[0];
            if lane.permissions == (VehClasses::EMERGENCY | VehClasses::AUTHORITY) {
                assert!(lane.width < 2.0);
                downgraded += 1;
            } else {
                assert!(lane.permissions.intersects(VehClasses::PASSENGER));
                open += 1;
            }
        }
        assert_eq!(downgraded, 1);
        assert_eq!(open, 2);
    }

    #[test]
    fn wide_lane_is_untouched_without_min_width() {
        let (out, _) = import_with(
            XML,
            ImportConfig {
                min_width: 0.0,
                ..ImportConfig::default()
            },
        );
        assert!(out.edges.contains("-R"));
        assert_eq!(out.edges.len(), 1);
    }
}

// ── Scenario: degenerate spiral ───────────────────────────────────────────────

#[cfg(test)]
mod degenerate_spiral {
    use super::helpers::import;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="R" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="10">
        <spiral curvStart="0" curvEnd="0"/>
      </geometry>
      <geometry s="10" x="10" y="0" hdg="0" length="90"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;

    #[test]
    fn warns_and_degrades_to_start_point() {
        let (out, obs) = import(XML);
        assert!(obs.has_warning("Could not compute spiral geometry"));
        // remaining segments still give the road ≥ 2 vertices → an edge
        let forward = out.edges.retrieve("-R").expect("edge survives");
        assert_eq!(forward.geometry.len(), 3);
        assert!((forward.geometry[0].x - 0.0).abs() < 1e-9);
        assert!((forward.geometry[2].x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn spiral_only_road_yields_no_edge() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="S" length="10.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="10">
        <spiral curvStart="0" curvEnd="0"/>
      </geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, obs) = import(xml);
        assert!(obs.has_warning("Ignoring road 'S' without geometry."));
        assert!(out.edges.is_empty());
    }
}

// ── Curved geometry ───────────────────────────────────────────────────────────

#[cfg(test)]
mod curved_geometry {
    use super::helpers::import;

    #[test]
    fn arc_quarter_circle_lands_near_expected_end() {
        // quarter circle, radius 10, length π·10/2, turning left
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="C" length="15.70796" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="15.70796">
        <arc curvature="0.1"/>
      </geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, _) = import(xml);
        let edge = out.edges.retrieve("-C").unwrap();
        assert!(edge.geometry.len() > 3);
        // sampled vertices stay on the circle around (0, 10)
        for i in 0..edge.geometry.len() {
            let p = edge.geometry[i];
            let r = (p.x * p.x + (p.y - 10.0) * (p.y - 10.0)).sqrt();
            assert!((r - 10.0).abs() < 1e-6, "vertex {i} off circle: r={r}");
        }
    }

    #[test]
    fn spiral_tracks_increasing_curvature() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="S" length="30.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="30">
        <spiral curvStart="0" curvEnd="0.05"/>
      </geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, obs) = import(xml);
        assert!(obs.warnings.is_empty(), "{:?}", obs.warnings);
        let edge = out.edges.retrieve("-S").unwrap();
        assert!(edge.geometry.len() > 5);
        // starts at the origin heading +x, bends to the left
        assert!((edge.geometry[0].x).abs() < 1e-6);
        let last = edge.geometry[edge.geometry.len() - 1];
        assert!(last.x > 20.0);
        assert!(last.y > 1.0);
    }

    #[test]
    fn elevation_is_lifted_onto_vertices() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="E" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <elevationProfile>
      <elevation s="0" a="5" b="0.1" c="0" d="0"/>
    </elevationProfile>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, _) = import(xml);
        let edge = out.edges.retrieve("-E").unwrap();
        assert!((edge.geometry[0].z - 5.0).abs() < 1e-9);
        let last = edge.geometry[edge.geometry.len() - 1];
        assert!((last.z - 15.0).abs() < 1e-6);
    }

    #[test]
    fn lane_offset_shifts_left() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="O" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneOffset s="0" a="2" b="0" c="0" d="0"/>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, _) = import(xml);
        let edge = out.edges.retrieve("-O").unwrap();
        // positive offset shifts the reference line to the left of travel
        for i in 0..edge.geometry.len() {
            assert!((edge.geometry[i].y - 2.0).abs() < 1e-6);
        }
    }
}

// ── Supplemental behaviour ────────────────────────────────────────────────────

#[cfg(test)]
mod loop_roads {
    use super::helpers::import;

    #[test]
    fn loop_between_same_nodes_is_split() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="L" length="100.0" junction="-1">
    <link>
      <predecessor elementType="junction" elementId="J"/>
      <successor elementType="junction" elementId="J"/>
    </link>
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let (out, obs) = import(xml);
        assert!(obs.has_warning("has to be split"));
        assert!(out.edges.contains("-L.0.00"));
        assert!(out.edges.contains("-L.50.00"));
    }
}

#[cfg(test)]
mod units_and_objects {
    use odr_core::{CollectingObserver, ImportConfig, LaneTypeCatalog};

    use crate::parser::parse_str;

    #[test]
    fn speed_units_convert_to_mps() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="R" length="10" junction="-1">
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <speed sOffset="0" max="36" unit="km/h"/>
            <speed sOffset="5" max="36" unit="mph"/>
            <speed sOffset="8" max="36"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
</OpenDRIVE>"#;
        let catalog = LaneTypeCatalog::with_defaults();
        let mut obs = CollectingObserver::new();
        let net = parse_str(xml, &catalog, &ImportConfig::default(), &mut obs).unwrap();
        let lane = &net.roads["R"].sections[0].right[0];
        assert!((lane.speeds[0].speed - 10.0).abs() < 1e-9);
        assert!((lane.speeds[1].speed - 16.0934).abs() < 1e-3);
        assert!((lane.speeds[2].speed - 36.0).abs() < 1e-9); // already m/s
    }

    #[test]
    fn repeat_expands_object_series() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="R" length="100" junction="-1">
    <objects>
      <object id="pole" type="pole" s="10" t="-2" width="1" length="1">
        <repeat s="10" length="20" distance="10" widthStart="1" widthEnd="3" tStart="-2" tEnd="-4"/>
      </object>
    </objects>
  </road>
</OpenDRIVE>"#;
        let catalog = LaneTypeCatalog::with_defaults();
        let mut obs = CollectingObserver::new();
        let net = parse_str(xml, &catalog, &ImportConfig::default(), &mut obs).unwrap();
        let objects = &net.roads["R"].objects;
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].id, "pole#0");
        assert_eq!(objects[2].id, "pole#2");
        assert!((objects[0].s - 10.0).abs() < 1e-9);
        assert!((objects[2].s - 30.0).abs() < 1e-9);
        // width and t interpolate across the series
        assert!((objects[0].width - 1.0).abs() < 1e-9);
        assert!((objects[1].width - 2.0).abs() < 1e-9);
        assert!((objects[2].t - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn version_mismatch_warns() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <header revMajor="1" revMinor="6"/>
</OpenDRIVE>"#;
        let catalog = LaneTypeCatalog::with_defaults();
        let mut obs = CollectingObserver::new();
        parse_str(xml, &catalog, &ImportConfig::default(), &mut obs).unwrap();
        assert!(obs.has_warning("version 1.2 is supported"));
    }

    #[test]
    fn geo_reference_extracts_proj() {
        let xml = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <geoReference><![CDATA[+proj=utm +zone=32 +ellps=WGS84]]></geoReference>
</OpenDRIVE>"#;
        let catalog = LaneTypeCatalog::with_defaults();
        let mut obs = CollectingObserver::new();
        let net = parse_str(xml, &catalog, &ImportConfig::default(), &mut obs).unwrap();
        assert_eq!(
            net.proj_string.as_deref(),
            Some("+proj=utm +zone=32 +ellps=WGS84")
        );
    }
}

#[cfg(test)]
mod priorities_and_signals {
    use super::helpers::import;

    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="P" length="100.0" junction="-1">
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <left><lane id="1" type="driving"><width sOffset="0" a="3.5"/></lane></left>
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
    <signals>
      <signal id="s1" type="301" orientation="+" dynamic="no" s="50"/>
      <signal id="s2" type="205" orientation="-" dynamic="no" s="50"/>
      <signal id="s3" type="1000001" name="tl0" orientation="+" dynamic="yes" s="50"/>
    </signals>
  </road>
</OpenDRIVE>"#;

    #[test]
    fn signage_sets_per_direction_priority() {
        let (out, _) = import(XML);
        assert_eq!(out.edges.retrieve("-P").unwrap().priority, 2);
        assert_eq!(out.edges.retrieve("P").unwrap().priority, 0);
    }

    #[test]
    fn traffic_light_controls_forward_edge() {
        let (out, _) = import(XML);
        assert_eq!(out.traffic_lights.get("-P").map(String::as_str), Some("tl0"));
    }
}

#[cfg(test)]
mod inner_road_signals {
    use std::collections::BTreeMap;

    use odr_core::CollectingObserver;

    use crate::model::{ContactPoint, ElementType, LaneSection, Link, LinkDirection, Road, Signal};
    use crate::signals::build_traffic_lights;

    use super::helpers::import;

    // the junction from `junction_flattening`, with a traffic light on the
    // connecting road
    const XML: &str = r#"<?xml version="1.0"?>
<OpenDRIVE>
  <road id="A" length="100.0" junction="-1">
    <link><successor elementType="junction" elementId="J"/></link>
    <planView>
      <geometry s="0" x="0" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right><lane id="-1" type="driving"><width sOffset="0" a="3.5"/></lane></right>
      </laneSection>
    </lanes>
  </road>
  <road id="X" length="10.0" junction="J">
    <link>
      <predecessor elementType="road" elementId="A" contactPoint="end"/>
      <successor elementType="road" elementId="B" contactPoint="start"/>
    </link>
    <planView>
      <geometry s="0" x="100" y="0" hdg="0" length="10"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/><successor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
    <signals>
      <signal id="t" type="1000001" name="tl-x" orientation="+" dynamic="yes" s="5"/>
    </signals>
  </road>
  <road id="B" length="100.0" junction="-1">
    <link><predecessor elementType="junction" elementId="J"/></link>
    <planView>
      <geometry s="0" x="110" y="0" hdg="0" length="100"><line/></geometry>
    </planView>
    <lanes>
      <laneSection s="0">
        <right>
          <lane id="-1" type="driving">
            <link><predecessor id="-1"/></link>
            <width sOffset="0" a="3.5"/>
          </lane>
        </right>
      </laneSection>
    </lanes>
  </road>
  <junction id="J">
    <connection id="0" incomingRoad="A" connectingRoad="X" contactPoint="start">
      <laneLink from="-1" to="-1"/>
    </connection>
  </junction>
</OpenDRIVE>"#;

    #[test]
    fn connecting_road_light_synthesizes_from_to_id() {
        let (out, obs) = import(XML);
        // X emits no edge, so the controlled relation is rebuilt from its
        // links: predecessor A at end-contact with positive orientation →
        // "-A", successor B at start-contact → "B"
        assert_eq!(
            out.traffic_lights.get("-A->B").map(String::as_str),
            Some("tl-x")
        );
        assert!(!obs.has_warning("Ambigous"));
    }

    #[test]
    fn duplicate_links_warn_verbatim() {
        let mut roads: BTreeMap<String, Road> = BTreeMap::new();
        for id in ["A", "B"] {
            let mut road = Road::new(id, "", "-1", 100.0);
            let mut sec = LaneSection::new(0.0);
            sec.out_id = id.to_string();
            road.sections.push(sec);
            roads.insert(id.to_string(), road);
        }
        let mut x = Road::new("X", "", "J", 10.0);
        x.sections.push(LaneSection::new(0.0));
        for _ in 0..2 {
            x.links.push(Link {
                direction: LinkDirection::Predecessor,
                element_type: ElementType::Road,
                element_id: "A".to_string(),
                contact_point: ContactPoint::End,
            });
            x.links.push(Link {
                direction: LinkDirection::Successor,
                element_type: ElementType::Road,
                element_id: "B".to_string(),
                contact_point: ContactPoint::Start,
            });
        }
        x.signals.push(Signal {
            id: "t".to_string(),
            kind: "1000001".to_string(),
            name: "tl-x".to_string(),
            orientation: 1,
            dynamic: true,
            s: 5.0,
        });
        roads.insert("X".to_string(), x);

        let mut obs = CollectingObserver::new();
        let lights = build_traffic_lights(&roads, &mut obs);

        assert_eq!(lights.get("-A->B").map(String::as_str), Some("tl-x"));
        assert!(obs
            .warnings
            .iter()
            .any(|w| w == "Ambigous start of connection."));
        assert!(obs
            .warnings
            .iter()
            .any(|w| w == "Ambigous end of connection."));
    }
}
