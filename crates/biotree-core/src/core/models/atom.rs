use crate::core::utils::elements::{atomic_weight, normalize_symbol};
use crate::core::utils::geometry::points_close;
use nalgebra::Point3;

/// Leaf payload of the hierarchy: one observed atomic position.
///
/// An atom is identified within its residue by `name`. When several
/// locations of the same atom were observed they share the name and differ
/// by `altloc`, and are grouped under a disordered atom node.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name with surrounding spaces stripped (e.g. "CA").
    pub name: String,
    /// Atom name as it appeared in the source, including padding.
    pub fullname: String,
    /// Cartesian coordinates in Angstroms.
    pub coord: Point3<f64>,
    /// Isotropic displacement (temperature) factor.
    pub bfactor: f64,
    /// Fractional occupancy in `[0, 1]`.
    pub occupancy: f64,
    /// Alternate-location code, `None` for an ordered atom.
    pub altloc: Option<char>,
    /// Serial number from the source file, if any.
    pub serial_number: Option<u32>,
    /// Capitalised element symbol (e.g. "C", "Fe").
    pub element: String,
    /// Atomic mass; NaN when the element is unknown.
    pub mass: f64,
}

impl Atom {
    /// Creates an ordered, fully occupied atom with its mass taken from `element`.
    pub fn new(name: &str, coord: Point3<f64>, element: &str) -> Self {
        let element = normalize_symbol(element);
        let mass = atomic_weight(&element).unwrap_or(f64::NAN);
        Self {
            name: name.trim().to_string(),
            fullname: name.to_string(),
            coord,
            bfactor: 0.0,
            occupancy: 1.0,
            altloc: None,
            serial_number: None,
            element,
            mass,
        }
    }

    pub fn with_altloc(mut self, altloc: char, occupancy: f64) -> Self {
        self.altloc = if altloc == ' ' { None } else { Some(altloc) };
        self.occupancy = occupancy;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_bfactor(mut self, bfactor: f64) -> Self {
        self.bfactor = bfactor;
        self
    }

    pub fn with_serial_number(mut self, serial_number: u32) -> Self {
        self.serial_number = Some(serial_number);
        self
    }

    /// Compares every descriptive field; coordinates only when asked.
    ///
    /// Masses are compared so that two NaN masses (unknown element) count as equal.
    pub fn strictly_equals(&self, other: &Atom, compare_coordinates: bool) -> bool {
        let same_mass = self.mass == other.mass || (self.mass.is_nan() && other.mass.is_nan());
        self.name == other.name
            && self.fullname == other.fullname
            && self.element == other.element
            && self.altloc == other.altloc
            && self.serial_number == other.serial_number
            && self.occupancy == other.occupancy
            && self.bfactor == other.bfactor
            && same_mass
            && (!compare_coordinates || points_close(&self.coord, &other.coord))
    }
}
