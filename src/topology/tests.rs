use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Point4};

use crate::prelude::*;

/// Gently curved sheet over [0, 2] x [0, 1]
fn sheet() -> NurbsSurface3D<f64> {
    let control_points = (0..3)
        .map(|i| {
            let x = i as f64;
            (0..2)
                .map(|j| {
                    let z = if i == 1 { 0.5 } else { 0. };
                    Point4::new(x, j as f64, z, 1.)
                })
                .collect()
        })
        .collect();
    NurbsSurface3D::try_new(
        2,
        1,
        vec![0., 0., 0., 1., 1., 1.],
        vec![0., 0., 1., 1.],
        control_points,
    )
    .unwrap()
}

/// Rectangle [u0, u1] x [v0, v1] as four pcurve edges with vertices at the edge starts
fn rectangle(
    builder: &mut GeometryBuilder,
    face: FaceId,
    (u0, u1): (f64, f64),
    (v0, v1): (f64, f64),
) -> Vec<EdgeId> {
    let corners = [
        Point2::new(u0, v0),
        Point2::new(u1, v0),
        Point2::new(u1, v1),
        Point2::new(u0, v1),
    ];
    let edges = (0..4)
        .map(|i| {
            let pcurve = NurbsCurve2D::polyline(&[corners[i], corners[(i + 1) % 4]]).unwrap();
            builder.add_edge(EdgeCurve::OnFace { face, pcurve })
        })
        .collect::<Vec<_>>();
    let vertices = edges
        .iter()
        .map(|e| builder.add_vertex(Vertex::OnEdge { edge: *e, t: 0. }))
        .collect::<Vec<_>>();
    for i in 0..4 {
        builder
            .set_edge_vertices(edges[i], vertices[i], vertices[(i + 1) % 4])
            .unwrap();
    }
    edges
}

#[test]
fn trimmed_rectangle_builds() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let edges = rectangle(&mut builder, face, (0.1, 0.4), (0., 1.));
    builder
        .add_loop(face, edges.iter().map(|e| (*e, Orientation::Forward)).collect())
        .unwrap();
    let geometry = builder.build().unwrap();

    assert_eq!(geometry.faces()[0].loops().len(), 1);
    let p = geometry.vertex_point(VertexId(1)).unwrap();
    let expected = geometry.faces()[0].surface().point_at(0.4, 0.);
    assert_relative_eq!(p, expected, epsilon = 1e-12);

    let uv = geometry.edge_params_on_face(edges[1], face, 0.5).unwrap();
    assert_relative_eq!(uv, Point2::new(0.4, 0.5), epsilon = 1e-12);
}

#[test]
fn clockwise_outer_loop_is_rejected() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let edges = rectangle(&mut builder, face, (0.1, 0.4), (0., 1.));
    let reversed = edges
        .iter()
        .rev()
        .map(|e| (*e, Orientation::Reversed))
        .collect();
    builder.add_loop(face, reversed).unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn hole_loop_must_be_clockwise() {
    let with_hole = |clockwise: bool| {
        let mut builder = GeometryBuilder::new();
        let face = builder.add_surface(sheet());
        builder.add_natural_boundary(face).unwrap();
        let edges = rectangle(&mut builder, face, (0.4, 0.6), (0.4, 0.6));
        let segments = if clockwise {
            edges
                .iter()
                .rev()
                .map(|e| (*e, Orientation::Reversed))
                .collect()
        } else {
            edges.iter().map(|e| (*e, Orientation::Forward)).collect()
        };
        builder.add_loop(face, segments).unwrap();
        builder.build()
    };

    let geometry = with_hole(true).unwrap();
    assert_eq!(geometry.faces()[0].loops().len(), 2);

    let err = with_hole(false).unwrap_err();
    assert!(err.to_string().contains("must run clockwise"));
}

#[test]
fn open_loop_is_rejected() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let edges = rectangle(&mut builder, face, (0.1, 0.4), (0., 1.));
    builder
        .add_loop(
            face,
            vec![
                (edges[0], Orientation::Forward),
                (edges[2], Orientation::Forward),
                (edges[1], Orientation::Forward),
                (edges[3], Orientation::Forward),
            ],
        )
        .unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn edge_without_vertices_is_rejected() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let pcurve = NurbsCurve2D::polyline(&[Point2::new(0., 0.), Point2::new(1., 0.)]).unwrap();
    let edge = builder.add_edge(EdgeCurve::OnFace { face, pcurve });
    builder
        .add_loop(face, vec![(edge, Orientation::Forward)])
        .unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn dangling_ids_are_rejected() {
    let mut builder = GeometryBuilder::new();
    assert!(builder.add_loop(FaceId(3), vec![]).is_err());

    let face = builder.add_surface(sheet());
    builder
        .add_loop(face, vec![(EdgeId(7), Orientation::Forward)])
        .unwrap();
    assert!(builder.build().is_err());
}

#[test]
fn misplaced_vertex_is_rejected() {
    let mut builder = GeometryBuilder::new();
    let line = NurbsCurve3D::polyline(&[Point3::new(0., 0., 0.), Point3::new(1., 0., 0.)]).unwrap();
    let edge = builder.add_edge(EdgeCurve::Free(line));
    let a = builder.add_vertex(Vertex::Point(Point3::new(0., 0., 0.)));
    let b = builder.add_vertex(Vertex::Point(Point3::new(1., 0.1, 0.)));
    assert!(builder.set_edge_vertices(edge, a, b).is_err());
    let c = builder.add_vertex(Vertex::Point(Point3::new(1., 0., 0.)));
    assert!(builder.set_edge_vertices(edge, a, c).is_ok());
}

#[test]
fn vertex_on_edge_near_point() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let pcurve = NurbsCurve2D::polyline(&[Point2::new(0., 0.25), Point2::new(1., 0.25)]).unwrap();
    let edge = builder.add_edge(EdgeCurve::OnFace { face, pcurve });

    let target = builder.geometry().edge_point_at(edge, 0.3).unwrap();
    let vertex = builder
        .add_vertex_on_edge_near(edge, &(target + nalgebra::Vector3::new(0., 0.01, 0.)))
        .unwrap();
    match builder.geometry().vertex(vertex).unwrap() {
        Vertex::OnEdge { t, .. } => assert_relative_eq!(*t, 0.3, epsilon = 1e-6),
        v => panic!("unexpected vertex {:?}", v),
    }
}

#[test]
fn chain_rule_derivative_matches_finite_difference() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(sheet());
    let pcurve = NurbsCurve2D::polyline(&[Point2::new(0.1, 0.2), Point2::new(0.9, 0.7)]).unwrap();
    let edge = builder.add_edge(EdgeCurve::OnFace { face, pcurve });
    let geometry = builder.geometry();

    let h = 1e-6;
    let t = 0.4;
    let fd = (geometry.edge_point_at(edge, t + h).unwrap() - geometry.edge_point_at(edge, t - h).unwrap())
        / (2. * h);
    assert_relative_eq!(geometry.edge_derivative_at(edge, t).unwrap(), fd, epsilon = 1e-6);
}
