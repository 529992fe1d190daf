#![cfg(feature = "serde")]

use wingshell::prelude::*;

#[test]
fn wing_options_round_trip() {
    let options = WingOptions::default()
        .with_element_size(0.25)
        .with_cutout((0.15, 0.35), (0.1, 0.9))
        .with_properties(IsoShellProperties::default().with_thickness(0.01))
        .with_export(ExportFlags::default().with_failure(true))
        .with_output_paths("out/wing.vtk", "out/mesh.vtk");
    let json = options.to_json_string().unwrap();
    let parsed = WingOptions::from_json_str(&json).unwrap();
    assert_eq!(parsed, options);
}

#[test]
fn invalid_json_is_an_error() {
    assert!(WingOptions::from_json_str("{\"scales\": [1.0]}").is_err());
    assert!(WingOptions::from_json_str("not json").is_err());
}

#[test]
fn knot_vector_serializes_as_a_list() {
    let knots = KnotVector::new(vec![0., 0., 0.5, 1., 1.]);
    let json = serde_json::to_string(&knots).unwrap();
    assert_eq!(json, "[0.0,0.0,0.5,1.0,1.0]");
    let parsed: KnotVector<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, knots);
}

#[test]
fn mesh_options_field_names() {
    let json = serde_json::to_value(MeshOptions::default()).unwrap();
    assert_eq!(json["element_size"], 0.1);
    assert_eq!(json["min_edge_divisions"], 1);
}
