use approx::assert_relative_eq;
use nalgebra::Point3;

use crate::prelude::*;

fn coarse() -> WingOptions {
    WingOptions::default().with_element_size(1.0)
}

#[test]
fn default_options() {
    let options = WingOptions::default();
    assert_eq!(options.scales, vec![6., 4., 3., 2., 1.]);
    assert_eq!(options.stations, vec![0., 2., 5., 10., 20.]);
    assert_eq!(options.num_control_points, 15);
    assert_eq!((options.curve_order, options.loft_order), (4, 4));
    assert_eq!(options.cutout_u, (0.1, 0.4));
    assert_eq!(options.cutout_v, (0., 1.));
    assert_eq!(options.mesh.element_size, 0.1);
    assert_eq!(options.vars_per_node, 6);
    assert_eq!(options.surface_path.to_str(), Some("wing.vtk"));
}

#[test]
fn sections_keep_trailing_edge() {
    let pipeline = WingPipeline::new(coarse());
    let sections = pipeline.try_sections().unwrap();
    assert_eq!(sections.len(), 5);
    for (section, (scale, z)) in sections
        .iter()
        .zip([(6., 0.), (4., 2.), (3., 5.), (2., 10.), (1., 20.)])
    {
        assert_eq!(section.degree(), 3);
        assert_eq!(section.control_points().len(), 15);
        let start = section.point_at(0.);
        let end = section.point_at(1.);
        assert_relative_eq!(start, Point3::new(scale, 0., z), epsilon = 1e-10);
        assert_relative_eq!(end, Point3::new(scale, 0., z), epsilon = 1e-10);
    }
}

#[test]
fn mismatched_stations_are_rejected() {
    let options = coarse().with_stations(vec![6., 4.], vec![0.]);
    assert!(WingPipeline::new(options).try_sections().is_err());
    let options = coarse().with_stations(vec![], vec![]);
    assert!(WingPipeline::new(options).try_sections().is_err());
}

#[test]
fn loft_spans_root_to_tip() {
    let pipeline = WingPipeline::new(coarse());
    let sections = pipeline.try_sections().unwrap();
    let surface = pipeline.try_loft(&sections).unwrap();
    assert_eq!((surface.u_degree(), surface.v_degree()), (3, 3));
    assert_relative_eq!(surface.point_at(0., 0.), Point3::new(6., 0., 0.), epsilon = 1e-9);
    assert_relative_eq!(surface.point_at(0., 1.), Point3::new(1., 0., 20.), epsilon = 1e-9);

    // the cutout lies on the upper skin
    assert!(surface.normal_at(0.25, 0.5).y > 0.);
}

#[test]
fn invalid_cutout_is_rejected() {
    let pipeline = WingPipeline::new(coarse());
    let sections = pipeline.try_sections().unwrap();
    let surface = pipeline.try_loft(&sections).unwrap();
    for (u, v) in [
        ((0.4, 0.1), (0., 1.)),
        ((-0.1, 0.4), (0., 1.)),
        ((0.1, 0.4), (0., 1.2)),
        ((0.1, 0.4), (0.5, 0.5)),
    ] {
        let pipeline = WingPipeline::new(coarse().with_cutout(u, v));
        assert!(pipeline.try_geometry(surface.clone()).is_err());
    }
}

#[test]
fn run_builds_consistent_model() {
    let pipeline = WingPipeline::new(coarse());
    let artifacts = pipeline.run().unwrap();
    let WingArtifacts {
        surface,
        geometry,
        mesh,
        model,
    } = &artifacts;

    assert_eq!(geometry.faces().len(), 1);
    assert_eq!(geometry.edges().len(), 4);
    assert!(mesh.num_quads() > 0);
    assert_eq!(model.num_elements(), mesh.num_quads());
    assert_eq!(model.num_nodes(), mesh.num_points());
    assert_eq!(model.num_variables(), 6 * mesh.num_points());

    let tensor = mesh.tensor_connectivity();
    for (e, quad) in tensor.iter().enumerate() {
        assert_eq!(model.element_nodes(e).unwrap(), quad);
    }

    // mesh corners are the cutout corners on the surface
    for (u, v) in [(0.1, 0.), (0.4, 0.), (0.4, 1.), (0.1, 1.)] {
        let corner = surface.point_at(u, v);
        assert!(mesh
            .points()
            .iter()
            .any(|p| (p - corner).norm() < 1e-8));
    }

    assert!(model
        .nodes()
        .iter()
        .all(|p| p.z >= -1e-9 && p.z <= 20. + 1e-9));
    let area = model.total_area().unwrap();
    assert!(area > 0.);
    assert_relative_eq!(
        model.total_mass().unwrap(),
        area * 2500. * 0.02,
        max_relative = 1e-9
    );
}

#[test]
fn write_outputs_creates_both_files() {
    let dir = std::env::temp_dir().join(format!("wingshell-wing-{}", std::process::id()));
    let options = coarse()
        .with_surface_divisions(8, 4)
        .with_output_paths(dir.join("wing.vtk"), dir.join("mesh.vtk"));
    let pipeline = WingPipeline::new(options);
    let artifacts = pipeline.run().unwrap();
    pipeline.write_outputs(&artifacts).unwrap();

    let surface = std::fs::read_to_string(dir.join("wing.vtk")).unwrap();
    assert!(surface.contains("DIMENSIONS 9 5 1"));
    let mesh = std::fs::read_to_string(dir.join("mesh.vtk")).unwrap();
    assert!(mesh.contains(&format!("CELLS {}", artifacts.model.num_elements())));
    assert!(mesh.contains("VECTORS displacements double"));
    std::fs::remove_dir_all(&dir).unwrap();
}
