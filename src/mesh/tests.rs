use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Point4};

use crate::prelude::*;

/// Plane over [0, 2] x [0, 1] in the xy plane
fn plane() -> NurbsSurface3D<f64> {
    NurbsSurface3D::try_new(
        1,
        1,
        vec![0., 0., 1., 1.],
        vec![0., 0., 1., 1.],
        vec![
            vec![Point4::new(0., 0., 0., 1.), Point4::new(0., 1., 0., 1.)],
            vec![Point4::new(2., 0., 0., 1.), Point4::new(2., 1., 0., 1.)],
        ],
    )
    .unwrap()
}

fn polygon_face(surface: NurbsSurface3D<f64>, corners: &[Point2<f64>]) -> Geometry {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(surface);
    let n = corners.len();
    let edges = (0..n)
        .map(|i| {
            let pcurve = NurbsCurve2D::polyline(&[corners[i], corners[(i + 1) % n]]).unwrap();
            builder.add_edge(EdgeCurve::OnFace { face, pcurve })
        })
        .collect::<Vec<_>>();
    let vertices = edges
        .iter()
        .map(|e| builder.add_vertex(Vertex::OnEdge { edge: *e, t: 0. }))
        .collect::<Vec<_>>();
    for i in 0..n {
        builder
            .set_edge_vertices(edges[i], vertices[i], vertices[(i + 1) % n])
            .unwrap();
    }
    builder
        .add_loop(face, edges.iter().map(|e| (*e, Orientation::Forward)).collect())
        .unwrap();
    builder.build().unwrap()
}

fn quad_area(points: &[Point3<f64>], q: &[usize; 4]) -> f64 {
    let (a, b, c, d) = (points[q[0]], points[q[1]], points[q[2]], points[q[3]]);
    0.5 * ((b - a).cross(&(c - a)).norm() + (c - a).cross(&(d - a)).norm())
}

#[test]
fn natural_boundary_plane_is_structured() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(plane());
    builder.add_natural_boundary(face).unwrap();
    let geometry = builder.build().unwrap();

    let mesh = Mesher::new(&geometry)
        .mesh(&MeshOptions::default().with_element_size(0.3))
        .unwrap();
    assert_eq!(mesh.num_quads(), 7 * 4);
    assert_eq!(mesh.num_points(), 8 * 5);
    assert_eq!(mesh.face_of(0), Some(face));
    assert_eq!(mesh.face_of(mesh.num_quads()), None);

    // vertex nodes come first
    for (i, id) in geometry.vertex_ids().enumerate() {
        assert_relative_eq!(mesh.points()[i], geometry.vertex_point(id).unwrap());
    }

    // counter-clockwise quads have normals along +z
    for q in mesh.quads() {
        let p = mesh.points();
        let n = (p[q[1]] - p[q[0]]).cross(&(p[q[3]] - p[q[0]]));
        assert!(n.z > 0.);
        assert_relative_eq!(quad_area(p, q), 2. / 7. * 0.25, epsilon = 1e-10);
    }
}

#[test]
fn opposite_edges_are_harmonized() {
    let corners = [
        Point2::new(0., 0.),
        Point2::new(1., 0.),
        Point2::new(0.6, 1.),
        Point2::new(0.2, 1.),
    ];
    let geometry = polygon_face(plane(), &corners);
    let mesh = Mesher::new(&geometry)
        .mesh(&MeshOptions::default().with_element_size(0.3))
        .unwrap();
    assert_eq!(mesh.num_quads(), 7 * 5);

    let total: f64 = mesh
        .quads()
        .iter()
        .map(|q| quad_area(mesh.points(), q))
        .sum();
    assert_relative_eq!(total, 1.4, epsilon = 1e-9);
}

#[test]
fn minimum_divisions_are_respected() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(plane());
    builder.add_natural_boundary(face).unwrap();
    let geometry = builder.build().unwrap();
    let mesh = Mesher::new(&geometry)
        .mesh(
            &MeshOptions::default()
                .with_element_size(10.)
                .with_min_edge_divisions(3),
        )
        .unwrap();
    assert_eq!(mesh.num_quads(), 9);
}

#[test]
fn connectivity_conversions() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(plane());
    builder.add_natural_boundary(face).unwrap();
    let geometry = builder.build().unwrap();
    let mesh = Mesher::new(&geometry)
        .mesh(&MeshOptions::default().with_element_size(0.5))
        .unwrap();

    let tensor = mesh.tensor_connectivity();
    for (q, t) in mesh.quads().iter().zip(tensor.iter()) {
        assert_eq!([q[0], q[1], q[3], q[2]], *t);
    }

    let mut back = tensor.clone();
    swap_quad_ordering(&mut back);
    assert_eq!(back.as_slice(), mesh.quads());

    let (ptr, conn) = mesh.csr_connectivity();
    assert_eq!(ptr.len(), mesh.num_quads() + 1);
    assert_eq!(ptr[1], 4);
    assert_eq!(*ptr.last().unwrap(), conn.len());
    assert_eq!(&conn[4..8], &tensor[1]);

    let flat = mesh.flattened_points();
    assert_eq!(flat.len(), 3 * mesh.num_points());
    assert_eq!(flat[3], mesh.points()[1].x);
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(plane());
    builder.add_natural_boundary(face).unwrap();
    let geometry = builder.build().unwrap();
    let mesher = Mesher::new(&geometry);
    assert!(mesher.mesh(&MeshOptions::default().with_element_size(0.)).is_err());
    assert!(mesher.mesh(&MeshOptions::default().with_element_size(-1.)).is_err());
    assert!(mesher.mesh(&MeshOptions::default().with_element_size(1e-12)).is_err());
    assert!(mesher
        .mesh(&MeshOptions::default().with_min_edge_divisions(MAX_EDGE_DIVISIONS + 1))
        .is_err());

    // face without loops
    let mut builder = GeometryBuilder::new();
    builder.add_surface(plane());
    let geometry = builder.build().unwrap();
    assert!(Mesher::new(&geometry).mesh(&MeshOptions::default()).is_err());

    // face with a hole
    let mut builder = GeometryBuilder::new();
    let face = builder.add_surface(plane());
    builder.add_natural_boundary(face).unwrap();
    let corners = [
        Point2::new(0.4, 0.4),
        Point2::new(0.4, 0.6),
        Point2::new(0.6, 0.6),
        Point2::new(0.6, 0.4),
    ];
    let hole = (0..4)
        .map(|i| {
            let pcurve = NurbsCurve2D::polyline(&[corners[i], corners[(i + 1) % 4]]).unwrap();
            builder.add_edge(EdgeCurve::OnFace { face, pcurve })
        })
        .collect::<Vec<_>>();
    let vertices = hole
        .iter()
        .map(|e| builder.add_vertex(Vertex::OnEdge { edge: *e, t: 0. }))
        .collect::<Vec<_>>();
    for i in 0..4 {
        builder
            .set_edge_vertices(hole[i], vertices[i], vertices[(i + 1) % 4])
            .unwrap();
    }
    builder
        .add_loop(face, hole.iter().map(|e| (*e, Orientation::Forward)).collect())
        .unwrap();
    let geometry = builder.build().unwrap();
    let err = Mesher::new(&geometry)
        .mesh(&MeshOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("2 loops"));

    // three sided face
    let triangle = [Point2::new(0., 0.), Point2::new(1., 0.), Point2::new(0., 1.)];
    let geometry = polygon_face(plane(), &triangle);
    assert!(Mesher::new(&geometry).mesh(&MeshOptions::default()).is_err());
}
