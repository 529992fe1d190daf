use nalgebra::{Matrix2, Matrix3, SVector, Vector3};

/// Shell strain `[ex, ey, gxy, kx, ky, kxy, gyz, gxz]`:
/// membrane strains, bending curvatures and transverse shear strains
pub type ShellStrain = SVector<f64, 8>;

/// Shell stress resultants `[Nx, Ny, Nxy, Mx, My, Mxy, Qyz, Qxz]`
pub type ShellStress = SVector<f64, 8>;

/// Material and thickness data of an isotropic shell
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsoShellProperties {
    /// Density (kg/m^3)
    pub density: f64,
    /// Elastic modulus (Pa)
    pub elastic_modulus: f64,
    pub poisson_ratio: f64,
    /// Transverse shear correction factor
    pub shear_correction: f64,
    /// Yield stress (Pa)
    pub yield_stress: f64,
    pub thickness: f64,
    /// Index of the design variable controlling the thickness
    pub thickness_design_var: Option<usize>,
    pub min_thickness: f64,
    pub max_thickness: f64,
}

impl Default for IsoShellProperties {
    /// Aluminium skin, 2 cm thick
    fn default() -> Self {
        Self {
            density: 2500.0,
            elastic_modulus: 70e9,
            poisson_ratio: 0.3,
            shear_correction: 5.0 / 6.0,
            yield_stress: 350e6,
            thickness: 0.02,
            thickness_design_var: Some(0),
            min_thickness: 0.002,
            max_thickness: 0.20,
        }
    }
}

impl IsoShellProperties {
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_elastic_modulus(mut self, elastic_modulus: f64) -> Self {
        self.elastic_modulus = elastic_modulus;
        self
    }

    pub fn with_poisson_ratio(mut self, poisson_ratio: f64) -> Self {
        self.poisson_ratio = poisson_ratio;
        self
    }

    pub fn with_shear_correction(mut self, shear_correction: f64) -> Self {
        self.shear_correction = shear_correction;
        self
    }

    pub fn with_yield_stress(mut self, yield_stress: f64) -> Self {
        self.yield_stress = yield_stress;
        self
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_thickness_bounds(mut self, min_thickness: f64, max_thickness: f64) -> Self {
        self.min_thickness = min_thickness;
        self.max_thickness = max_thickness;
        self
    }

    pub fn with_thickness_design_var(mut self, design_var: Option<usize>) -> Self {
        self.thickness_design_var = design_var;
        self
    }
}

/// Laminate stiffness matrices of a first-order shear deformation shell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellStiffness {
    /// In-plane stiffness
    pub a: Matrix3<f64>,
    /// Coupling stiffness, zero for a symmetric section
    pub b: Matrix3<f64>,
    /// Bending stiffness
    pub d: Matrix3<f64>,
    /// Transverse shear stiffness
    pub a_s: Matrix2<f64>,
}

/// Isotropic first-order shear deformation theory constitutive law with a variable thickness
/// # Example
/// ```
/// use wingshell::prelude::*;
/// use approx::assert_relative_eq;
///
/// let mut stiffness = IsoFsdtStiffness::try_new(IsoShellProperties::default()).unwrap();
/// assert_relative_eq!(stiffness.mass_moments()[0], 2500. * 0.02);
///
/// stiffness.set_thickness(1.0);
/// assert_eq!(stiffness.thickness(), 0.20);
/// ```
#[derive(Clone, Debug)]
pub struct IsoFsdtStiffness {
    properties: IsoShellProperties,
    thickness: f64,
}

impl IsoFsdtStiffness {
    pub fn try_new(properties: IsoShellProperties) -> anyhow::Result<Self> {
        let p = &properties;
        anyhow::ensure!(p.density > 0., "Density must be positive, got {}", p.density);
        anyhow::ensure!(
            p.elastic_modulus > 0.,
            "Elastic modulus must be positive, got {}",
            p.elastic_modulus
        );
        anyhow::ensure!(
            p.poisson_ratio > -1. && p.poisson_ratio < 0.5,
            "Poisson ratio must lie in (-1, 0.5), got {}",
            p.poisson_ratio
        );
        anyhow::ensure!(
            p.shear_correction > 0.,
            "Shear correction factor must be positive, got {}",
            p.shear_correction
        );
        anyhow::ensure!(
            p.yield_stress > 0.,
            "Yield stress must be positive, got {}",
            p.yield_stress
        );
        anyhow::ensure!(
            p.thickness > 0.,
            "Thickness must be positive, got {}",
            p.thickness
        );
        anyhow::ensure!(
            p.min_thickness <= p.max_thickness,
            "Minimum thickness {} exceeds maximum thickness {}",
            p.min_thickness,
            p.max_thickness
        );
        anyhow::ensure!(
            p.thickness >= p.min_thickness && p.thickness <= p.max_thickness,
            "Thickness {} lies outside [{}, {}]",
            p.thickness,
            p.min_thickness,
            p.max_thickness
        );

        let thickness = properties.thickness;
        Ok(Self {
            properties,
            thickness,
        })
    }

    pub fn properties(&self) -> &IsoShellProperties {
        &self.properties
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn thickness_design_var(&self) -> Option<usize> {
        self.properties.thickness_design_var
    }

    /// Set the thickness, clamped to the thickness bounds
    pub fn set_thickness(&mut self, thickness: f64) {
        self.thickness = thickness.clamp(
            self.properties.min_thickness,
            self.properties.max_thickness,
        );
    }

    /// Plane stress stiffness of the material
    fn plane_stress(&self) -> Matrix3<f64> {
        let e = self.properties.elastic_modulus;
        let nu = self.properties.poisson_ratio;
        let c = e / (1. - nu * nu);
        Matrix3::new(
            c,
            c * nu,
            0.,
            c * nu,
            c,
            0.,
            0.,
            0.,
            c * 0.5 * (1. - nu),
        )
    }

    pub fn stiffness(&self) -> ShellStiffness {
        let t = self.thickness;
        let a = self.plane_stress() * t;
        let d = a * (t * t / 12.);
        let e = self.properties.elastic_modulus;
        let nu = self.properties.poisson_ratio;
        let g = e / (2. * (1. + nu));
        ShellStiffness {
            a,
            b: Matrix3::zeros(),
            d,
            a_s: Matrix2::identity() * (self.properties.shear_correction * g * t),
        }
    }

    /// Mass moments `[rho t, 0, rho t^3 / 12]` per unit area
    pub fn mass_moments(&self) -> [f64; 3] {
        let rho = self.properties.density;
        let t = self.thickness;
        [rho * t, 0., rho * t * t * t / 12.]
    }

    /// Stress resultants for the given strain
    pub fn stress(&self, strain: &ShellStrain) -> ShellStress {
        let s = self.stiffness();
        let e = strain.fixed_rows::<3>(0).into_owned();
        let k = strain.fixed_rows::<3>(3).into_owned();
        let g = strain.fixed_rows::<2>(6).into_owned();

        let n = s.a * e + s.b * k;
        let m = s.b * e + s.d * k;
        let q = s.a_s * g;

        let mut stress = ShellStress::zeros();
        stress.fixed_rows_mut::<3>(0).copy_from(&n);
        stress.fixed_rows_mut::<3>(3).copy_from(&m);
        stress.fixed_rows_mut::<2>(6).copy_from(&q);
        stress
    }

    /// Von Mises stress over the yield stress, the larger of the top and bottom fibers
    pub fn failure(&self, strain: &ShellStrain) -> f64 {
        let q = self.plane_stress();
        let half = 0.5 * self.thickness;
        let e = Vector3::new(strain[0], strain[1], strain[2]);
        let k = Vector3::new(strain[3], strain[4], strain[5]);

        [-half, half]
            .iter()
            .map(|z| {
                let s = q * (e + k * *z);
                von_mises(&s) / self.properties.yield_stress
            })
            .fold(0., f64::max)
    }
}

/// Von Mises stress of a plane stress state `[sx, sy, txy]`
pub fn von_mises(s: &Vector3<f64>) -> f64 {
    (s[0] * s[0] + s[1] * s[1] - s[0] * s[1] + 3. * s[2] * s[2]).sqrt()
}
