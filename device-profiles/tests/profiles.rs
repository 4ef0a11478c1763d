//! Built-in profiles against small hand-written dumps.

use std::collections::HashSet;

use netgraph::Diagram;
use netgraph::graph::ViewAnchor;
use netgraph::model::{CurveKind, LinkKind, NodeId};
use pretty_assertions::assert_eq;

fn name(d: &Diagram, id: NodeId) -> String {
    let node = d.node(id).expect("node exists");
    format!("{} {}", node.type_name(), node.key())
}

fn find(d: &Diagram, type_name: &str, key: &str) -> NodeId {
    d.find_anchor(type_name, key)
        .map(|n| n.id())
        .unwrap_or_else(|| panic!("{type_name} {key} missing"))
}

/* ------------------------------------------------------------------------- */
/* OMCI                                                                      */
/* ------------------------------------------------------------------------- */

const MIB: &str = r#"<MIB>
  <OntG><ManagedEntityId>0</ManagedEntityId><SerialNumber>4252434d12345678</SerialNumber></OntG>
  <AniG><ManagedEntityId>32769</ManagedEntityId></AniG>
  <Omci><ManagedEntityId>0</ManagedEntityId></Omci>
  <MacBridgeServiceProfile><ManagedEntityId>1</ManagedEntityId></MacBridgeServiceProfile>
  <MacBridgePortConfigData>
    <ManagedEntityId>2</ManagedEntityId><BridgeId>1</BridgeId><TpType>3</TpType><TpPointer>3</TpPointer>
  </MacBridgePortConfigData>
  <VlanTaggingFilterData><ManagedEntityId>2</ManagedEntityId><ForwardOperation>16</ForwardOperation></VlanTaggingFilterData>
  <MapperServiceProfile>
    <ManagedEntityId>3</ManagedEntityId><TpType>0</TpType><TpPointer>65535</TpPointer>
    <InterworkTpPointerPriority0>4</InterworkTpPointerPriority0>
    <InterworkTpPointerPriority1>5</InterworkTpPointerPriority1>
  </MapperServiceProfile>
  <GemInterworkingTp><ManagedEntityId>4</ManagedEntityId><GemPortNetworkCtpConnPointer>6</GemPortNetworkCtpConnPointer></GemInterworkingTp>
  <GemInterworkingTp><ManagedEntityId>5</ManagedEntityId><GemPortNetworkCtpConnPointer>6</GemPortNetworkCtpConnPointer></GemInterworkingTp>
  <GemPortNetworkCtp>
    <ManagedEntityId>6</ManagedEntityId><TContPointer>32768</TContPointer>
    <UpstreamTrafficManagementPointer>32769</UpstreamTrafficManagementPointer>
  </GemPortNetworkCtp>
  <TCont><ManagedEntityId>32768</ManagedEntityId></TCont>
  <PriorityQueueG><ManagedEntityId>32769</ManagedEntityId><RelatedPort>2147483648</RelatedPort></PriorityQueueG>
  <PptpEthernetUni><ManagedEntityId>257</ManagedEntityId></PptpEthernetUni>
  <CircuitPack><ManagedEntityId>257</ManagedEntityId></CircuitPack>
</MIB>"#;

#[test]
fn omci_nodes_carry_reference_cards() {
    let profile = device_profiles::builtin("omci").expect("omci compiles");
    let d = profile.parse(MIB).expect("mib parses");

    let ont = d.render_node(find(&d, "OntG", "0")).expect("drawn");
    assert_eq!(ont.label, "ONU-G 0");
    assert_eq!(ont.shape.as_deref(), Some("box"));
    assert_eq!(ont.margin, Some(10));
    assert_eq!(ont.font_size, Some(24));
    assert_eq!(
        ont.title.as_deref(),
        Some("ONU-G\nMeClass: 256\nMeId: 0\n\nChapter: 9.1.1\nPage: 55")
    );

    let queue = d.render_node(find(&d, "PriorityQueueG", "32769")).expect("drawn");
    assert_eq!(queue.label, "Q 32769");
    assert_eq!(queue.shape.as_deref(), Some("ellipse"));
}

#[test]
fn omci_pointer_hooks_and_field_maps_resolve() {
    let profile = device_profiles::builtin("omci").expect("omci compiles");
    let d = profile.parse(MIB).expect("mib parses");

    let edges: HashSet<(String, String)> = d
        .links()
        .iter()
        .map(|l| (name(&d, l.from()), name(&d, l.to())))
        .collect();
    for (from, to) in [
        ("OntG 0", "AniG 32769"),
        ("AniG 32769", "Omci 0"),
        ("MacBridgePortConfigData 2", "MacBridgeServiceProfile 1"),
        ("MacBridgePortConfigData 2", "VlanTaggingFilterData 2"),
        ("MacBridgePortConfigData 2", "MapperServiceProfile 3"),
        ("MapperServiceProfile 3", "GemInterworkingTp 4"),
        ("MapperServiceProfile 3", "GemInterworkingTp 5"),
        ("GemPortNetworkCtp 6", "TCont 32768"),
        ("PriorityQueueG 32769", "TCont 32768"),
        ("PptpEthernetUni 257", "CircuitPack 257"),
    ] {
        assert!(edges.contains(&(from.to_string(), to.to_string())), "{from} → {to} missing");
    }
}

#[test]
fn omci_pbit_links_are_bent_apart() {
    let profile = device_profiles::builtin("omci").expect("omci compiles");
    let d = profile.parse(MIB).expect("mib parses");
    let g = d.draw(&[]);

    let pbit = |note: &str| {
        g.edges
            .iter()
            .find(|e| e.label == note)
            .and_then(|e| e.curve)
            .unwrap_or_else(|| panic!("{note} not curved"))
    };
    // The mapper has three links: one incoming, two p-bits.
    let first = pbit("Pbit-0");
    assert_eq!(first.kind, CurveKind::CurvedCw);
    assert!((first.roundness - 0.225).abs() < 1e-6);
    let second = pbit("Pbit-1");
    assert_eq!(second.kind, CurveKind::CurvedCw);
    assert!((second.roundness - 0.15).abs() < 1e-6);

    assert!(g.edges.iter().filter(|e| !e.label.starts_with("Pbit")).all(|e| e.curve.is_none()));
}

#[test]
fn omci_attributes_use_g988_decoders() {
    let profile = device_profiles::builtin("omci").expect("omci compiles");
    let d = profile.parse(MIB).expect("mib parses");

    let filter = d.describe(find(&d, "VlanTaggingFilterData", "2")).expect("described");
    let forward = &filter.children[1];
    assert_eq!(forward.label, "ForwardOperation: 16");
    assert_eq!(forward.children[0].label, "Mode: 0x10");

    let ont = d.describe(find(&d, "OntG", "0")).expect("described");
    let serial: Vec<&str> = ont.children[1].children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(serial[0], "Hex(8): 4252434D-12345678");
}

#[test]
fn omci_bridge_view_stays_on_its_bridge() {
    let profile = device_profiles::builtin("omci").expect("omci compiles");
    let d = profile.parse(MIB).expect("mib parses");

    let views: Vec<String> = d.views(&profile.display).iter().map(ToString::to_string).collect();
    assert_eq!(views, vec!["MacBridgeServiceProfile 1", "OntG 0"]);

    let anchor: ViewAnchor = "MacBridgeServiceProfile 1".parse().expect("anchor");
    let g = d.draw_view(&profile.display, &anchor, None);
    let types: HashSet<&str> = g.nodes.iter().map(|n| n.type_name.as_str()).collect();
    assert_eq!(g.nodes.len(), 9);
    assert!(types.contains("PriorityQueueG"));
    assert!(!types.contains("OntG"));
    assert!(!types.contains("CircuitPack"));
}

/* ------------------------------------------------------------------------- */
/* RDP                                                                       */
/* ------------------------------------------------------------------------- */

const RDP: &str = r#"{
  "port": {
    "port/index=0": { "tm_cfg": { "egress_tm": "egress_tm/dir=ds,index=0" } },
  },
  "gem": {
    "gem/index=2": { "gem_port": 1026, "us_cfg": { "tcont": "tcont/index=1" } },
  },
  "tcont": {
    "tcont/index=1": { "egress_tm": "egress_tm/dir=us,index=1" },
  },
  "egress_tm": {
    "egress_tm/dir=us,index=1": { "mode": "sp", "queue_cfg": [ { "queue_id": 0 }, { "queue_id": 1 }, ] },
    "egress_tm/dir=ds,index=0": { "mode": "wrr" },
  },
  "ingress_class": {
    "ingress_class/dir=us,index=0": {
      "cfg": { "prty": 3 },
      "flow": [ { "key": { "ingress_port": 0 }, "result": { "wan_flow": 2, "vlan_action": "vlan_action/index=7" } } ],
    },
    "ingress_class/dir=ds,index=1": {
      "flow": [ { "key": { "gem_flow": 2 }, "result": { "egress_port": 0 } } ],
    },
  },
  "vlan_action": {
    "vlan_action/index=7": { "cmd": "push" },
  },
}"#;

#[test]
fn rdp_labels_follow_node_classes() {
    let profile = device_profiles::builtin("rdp").expect("rdp compiles");
    let d = profile.parse(RDP).expect("loose json parses");

    let labels: Vec<String> = d.draw(&[]).nodes.into_iter().map(|n| n.label).collect();
    assert_eq!(
        labels,
        vec![
            "port port/index=0",
            "gem/index=2\n(port 1026)",
            "tcont tcont/index=1",
            "egress_tm/dir=us,index=1\n(sp)",
            "egress_tm/dir=ds,index=0\n(wrr)",
            "0 - qid 0",
            "1 - qid 1",
            "ingress_class/dir=us,index=0\n(prty 3)",
            "ingress_class ingress_class/dir=ds,index=1",
            "flow 0",
            "flow 0",
            "vlan_action vlan_action/index=7",
        ]
    );
}

#[test]
fn rdp_flows_sit_between_ingress_and_egress() {
    let profile = device_profiles::builtin("rdp").expect("rdp compiles");
    let mut d = profile.parse(RDP).expect("loose json parses");

    let count = |d: &Diagram, kind: LinkKind| d.links().iter().filter(|l| l.kind() == kind).count();
    assert_eq!(count(&d, LinkKind::Upstream), 2);
    assert_eq!(count(&d, LinkKind::Downstream), 2);
    assert_eq!(count(&d, LinkKind::Reference), 4);
    assert_eq!(count(&d, LinkKind::Parent), 4);

    let flow_us = d.links_of(find(&d, "ingress_class", "ingress_class/dir=us,index=0")).next().map(|l| l.from());
    let flow_us = flow_us.expect("upstream flow");
    let upstream: Vec<(String, String)> = d
        .links()
        .iter()
        .filter(|l| l.kind() == LinkKind::Upstream)
        .map(|l| (name(&d, l.from()), name(&d, l.to())))
        .collect();
    assert_eq!(
        upstream,
        vec![
            ("port port/index=0".to_string(), name(&d, flow_us)),
            (name(&d, flow_us), "gem gem/index=2".to_string()),
        ]
    );

    let traffic = d.draw_link_view(&profile.display, Some("Traffic Links"));
    assert_eq!(traffic.edges.len(), 4);

    let links = d.link_count();
    let again = d.synthesize(&profile.synthesizers);
    assert_eq!(again.added, 0);
    assert_eq!(d.link_count(), links);
}

#[test]
fn rdp_without_views_has_no_anchors() {
    let profile = device_profiles::builtin("rdp").expect("rdp compiles");
    let d = profile.parse(RDP).expect("loose json parses");
    assert!(d.views(&profile.display).is_empty());
    assert_eq!(profile.display.default_link_view(), Some("All Links"));
}

/* ------------------------------------------------------------------------- */
/* Model1                                                                    */
/* ------------------------------------------------------------------------- */

const MODEL1: &str = r#"<config>
  <forwarding>
    <forwarder>
      <name>fwd1</name>
      <ports><port><name>p1</name><sub-interface>eth0.100</sub-interface></port></ports>
    </forwarder>
  </forwarding>
  <interfaces>
    <interface>
      <name>eth0.100</name>
      <type>bbfift:vlan-sub-interface</type>
      <subif-lower-layer><interface>eth0</interface></subif-lower-layer>
      <rule><name>r1</name></rule>
      <egress-rewrite><pop-tags>1</pop-tags></egress-rewrite>
    </interface>
    <interface>
      <name>eth0</name>
      <type>ianaift:ethernetCsmacd</type>
      <egress-rewrite/>
    </interface>
  </interfaces>
</config>"#;

#[test]
fn model1_interfaces_are_typed_and_layered() {
    let profile = device_profiles::builtin("model1").expect("model1 compiles");
    let d = profile.parse(MODEL1).expect("xml parses");

    let g = d.draw(&[]);
    let labels: Vec<&str> = g.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "<forwarder>\nfwd1",
            "<port>\np1",
            "<interface>\neth0.100\nvlan-sub-interface",
            "<interface>\neth0\nethernetCsmacd",
            "<rule>\nr1",
            "<egress-rewrite>\nEGRESS_REWRITE",
        ]
    );

    let eth0 = &g.nodes[3];
    assert_eq!(eth0.level, Some(5));
    assert_eq!(eth0.color.as_deref(), Some("red"));
    let sub = &g.nodes[2];
    assert_eq!(sub.level, Some(4));
    assert_eq!(sub.color, None);

    let references: Vec<(String, String)> = d
        .links()
        .iter()
        .filter(|l| l.kind() == LinkKind::Reference)
        .map(|l| (name(&d, l.from()), name(&d, l.to())))
        .collect();
    assert_eq!(
        references,
        vec![
            ("port p1".to_string(), "interface eth0.100".to_string()),
            ("interface eth0.100".to_string(), "interface eth0".to_string()),
        ]
    );
}

#[test]
fn model1_forwarder_view_reaches_every_interface() {
    let profile = device_profiles::builtin("model1").expect("model1 compiles");
    let d = profile.parse(MODEL1).expect("xml parses");

    let views = d.views(&profile.display);
    assert_eq!(views, vec![ViewAnchor::new("forwarder", "fwd1")]);
    let g = d.draw_view(&profile.display, &views[0], None);
    assert_eq!(g.nodes.len(), d.node_count());
}

/* ------------------------------------------------------------------------- */
/* Loading                                                                   */
/* ------------------------------------------------------------------------- */

#[test]
fn profiles_load_by_name_or_from_disk() {
    for name in device_profiles::PROFILE_NAMES {
        let profile = device_profiles::builtin(name).expect("built-in compiles");
        assert_eq!(profile.name, name);
    }
    let err = device_profiles::builtin("gpon").expect_err("unknown profile");
    assert!(err.to_string().contains("unknown profile `gpon`"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("model1.yaml");
    let yaml = device_profiles::builtin_yaml("model1").expect("shipped");
    std::fs::write(&path, yaml).expect("write profile");
    let profile = device_profiles::from_path(&path).expect("loads from disk");
    assert_eq!(profile.schema.types().len(), 2);

    let broken = dir.path().join("broken.yaml");
    std::fs::write(&broken, "name: x\nschema: [").expect("write profile");
    assert!(device_profiles::from_path(&broken).is_err());
}
