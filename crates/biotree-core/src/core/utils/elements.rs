use phf::{Map, phf_map};

/// Standard atomic weights (IUPAC, g/mol) keyed by capitalised element symbol.
static ATOMIC_WEIGHTS: Map<&'static str, f64> = phf_map! {
    "H" => 1.008, "D" => 2.014, "He" => 4.0026,
    "Li" => 6.94, "Be" => 9.0122, "B" => 10.81, "C" => 12.011, "N" => 14.007,
    "O" => 15.999, "F" => 18.998, "Ne" => 20.180,
    "Na" => 22.990, "Mg" => 24.305, "Al" => 26.982, "Si" => 28.085, "P" => 30.974,
    "S" => 32.06, "Cl" => 35.45, "Ar" => 39.948,
    "K" => 39.098, "Ca" => 40.078, "Mn" => 54.938, "Fe" => 55.845, "Co" => 58.933,
    "Ni" => 58.693, "Cu" => 63.546, "Zn" => 65.38, "Ga" => 69.723, "As" => 74.922,
    "Se" => 78.971, "Br" => 79.904, "Kr" => 83.798,
    "Rb" => 85.468, "Sr" => 87.62, "Mo" => 95.95, "Cd" => 112.41, "I" => 126.90,
    "Xe" => 131.29, "Cs" => 132.91, "Ba" => 137.33,
    "W" => 183.84, "Pt" => 195.08, "Au" => 196.97, "Hg" => 200.59, "Pb" => 207.2,
    "U" => 238.03,
};

/// Normalises an element symbol to its conventional capitalisation ("FE" -> "Fe").
pub fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Looks up the standard atomic weight of an element, case-insensitively.
pub fn atomic_weight(symbol: &str) -> Option<f64> {
    ATOMIC_WEIGHTS.get(normalize_symbol(symbol).as_str()).copied()
}
