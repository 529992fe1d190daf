use approx::assert_relative_eq;
use nalgebra::Point2;
use wingshell::prelude::*;

fn coarse_pipeline() -> WingPipeline {
    WingPipeline::new(WingOptions::default().with_element_size(0.5))
}

#[test]
fn wing_model_from_default_stations() {
    let pipeline = coarse_pipeline();
    let artifacts = pipeline.run().unwrap();
    let model = &artifacts.model;
    assert_eq!(model.vars_per_node(), 6);
    assert_eq!(model.num_elements(), artifacts.mesh.num_quads());

    // every element shares the same constitutive law
    for e in 0..model.num_elements() {
        let element = model.element(e).unwrap();
        assert_eq!(element.kind(), ElementKind::Shell);
        assert_eq!(element.num_nodes(), 4);
        assert_relative_eq!(element.thickness(), 0.02);
    }

    // the unloaded model carries no strain
    for e in 0..model.num_elements() {
        assert_relative_eq!(model.element_failure(e).unwrap(), 0.);
    }
}

#[test]
fn mesh_connectivity_swaps_third_and_fourth_nodes() {
    let artifacts = coarse_pipeline().run().unwrap();
    let mesh = &artifacts.mesh;
    let (ptr, conn) = mesh.csr_connectivity();
    assert_eq!(ptr.len(), mesh.num_quads() + 1);
    assert_eq!(*ptr.last().unwrap(), 4 * mesh.num_quads());
    for (quad, nodes) in mesh.quads().iter().zip(conn.chunks(4)) {
        assert_eq!(nodes, &[quad[0], quad[1], quad[3], quad[2]]);
    }

    let mut quads = mesh.tensor_connectivity();
    swap_quad_ordering(&mut quads);
    assert_eq!(quads, mesh.quads());
}

#[test]
fn finer_mesh_converges_to_the_same_area() {
    let coarse = coarse_pipeline().run().unwrap().model.total_area().unwrap();
    let fine = WingPipeline::new(WingOptions::default().with_element_size(0.25))
        .run()
        .unwrap()
        .model
        .total_area()
        .unwrap();
    assert!(fine >= coarse * 0.99);
    assert_relative_eq!(coarse, fine, max_relative = 0.02);
}

#[test]
fn custom_airfoil_and_cutout() {
    let diamond = Airfoil::new(vec![
        Point2::new(1., 0.),
        Point2::new(0.5, 0.1),
        Point2::new(0., 0.),
        Point2::new(0.5, -0.1),
        Point2::new(1., 0.),
    ]);
    let options = WingOptions::default()
        .with_stations(vec![2., 1.], vec![0., 5.])
        .with_num_control_points(5)
        .with_curve_order(2)
        .with_cutout((0.05, 0.45), (0.2, 0.8))
        .with_element_size(0.5);
    let pipeline = WingPipeline::new(options).with_airfoil(diamond);
    let artifacts = pipeline.run().unwrap();
    assert_eq!(artifacts.surface.v_degree(), 1);
    assert!(artifacts
        .model
        .nodes()
        .iter()
        .all(|p| p.z >= 1. - 1e-9 && p.z <= 4. + 1e-9));
}
