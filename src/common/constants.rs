//! Contains mathematical and physical constants, unit conversions, and chemical elements.
use phf::phf_map;










// Mathematical
pub const PI: f64 = 3.141592653589793;










// Physical

// Unit Conversion (the host engine works in nm, kJ/mol, and amu)
pub const ANGSTROM_TO_NM: f64 = 0.1;
pub const NM_TO_ANGSTROM: f64 = 1.0 / ANGSTROM_TO_NM;

pub const BOHR_TO_ANGSTROM: f64 = 0.52917720859;
pub const BOHR_TO_NM: f64 = BOHR_TO_ANGSTROM * ANGSTROM_TO_NM;

pub const KCAL_TO_KJ: f64 = 4.184;
pub const EV_TO_KJ_PER_MOL: f64 = 96.48533212331;
pub const HARTREE_TO_KJ_PER_MOL: f64 = 2625.4996394799;

/// Boxes whose volume falls below this value (in the box's own length unit cubed) are degenerate.
pub const MIN_BOX_VOLUME: f64 = 1.0E-12;










// Chemical

/// Chemical elements from H to Xe. The discriminant is the atomic number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Element
{
    H = 1, He,
    Li, Be, B, C, N, O, F, Ne,
    Na, Mg, Al, Si, P, S, Cl, Ar,
    K, Ca, Sc, Ti, V, Cr, Mn, Fe, Co, Ni, Cu, Zn, Ga, Ge, As, Se, Br, Kr,
    Rb, Sr, Y, Zr, Nb, Mo, Tc, Ru, Rh, Pd, Ag, Cd, In, Sn, Sb, Te, I, Xe,
}

// Symbol and standard atomic mass (amu), indexed by atomic number - 1
const ELEMENT_DATA: [(&str, f64); 54] =
[
    ("H", 1.008), ("He", 4.0026),
    ("Li", 6.94), ("Be", 9.0122), ("B", 10.81), ("C", 12.011), ("N", 14.007), ("O", 15.999), ("F", 18.998), ("Ne", 20.180),
    ("Na", 22.990), ("Mg", 24.305), ("Al", 26.982), ("Si", 28.085), ("P", 30.974), ("S", 32.06), ("Cl", 35.45), ("Ar", 39.948),
    ("K", 39.098), ("Ca", 40.078), ("Sc", 44.956), ("Ti", 47.867), ("V", 50.942), ("Cr", 51.996), ("Mn", 54.938), ("Fe", 55.845),
    ("Co", 58.933), ("Ni", 58.693), ("Cu", 63.546), ("Zn", 65.38), ("Ga", 69.723), ("Ge", 72.630), ("As", 74.922), ("Se", 78.971),
    ("Br", 79.904), ("Kr", 83.798),
    ("Rb", 85.468), ("Sr", 87.62), ("Y", 88.906), ("Zr", 91.224), ("Nb", 92.906), ("Mo", 95.95), ("Tc", 98.0), ("Ru", 101.07),
    ("Rh", 102.91), ("Pd", 106.42), ("Ag", 107.87), ("Cd", 112.41), ("In", 114.82), ("Sn", 118.71), ("Sb", 121.76), ("Te", 127.60),
    ("I", 126.90), ("Xe", 131.29),
];

// 'SYMBOL_TO_ELEMENT' is a static structure of type 'phf::Map', initialized by macro 'phf_map'
static SYMBOL_TO_ELEMENT: phf::Map<&'static str, Element> = phf_map!
{
    "H" => Element::H,
    "He" => Element::He,

    "Li" => Element::Li,
    "Be" => Element::Be,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "Ne" => Element::Ne,

    "Na" => Element::Na,
    "Mg" => Element::Mg,
    "Al" => Element::Al,
    "Si" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "Ar" => Element::Ar,

    "K" => Element::K,
    "Ca" => Element::Ca,
    "Sc" => Element::Sc,
    "Ti" => Element::Ti,
    "V" => Element::V,
    "Cr" => Element::Cr,
    "Mn" => Element::Mn,
    "Fe" => Element::Fe,
    "Co" => Element::Co,
    "Ni" => Element::Ni,
    "Cu" => Element::Cu,
    "Zn" => Element::Zn,
    "Ga" => Element::Ga,
    "Ge" => Element::Ge,
    "As" => Element::As,
    "Se" => Element::Se,
    "Br" => Element::Br,
    "Kr" => Element::Kr,

    "Rb" => Element::Rb,
    "Sr" => Element::Sr,
    "Y" => Element::Y,
    "Zr" => Element::Zr,
    "Nb" => Element::Nb,
    "Mo" => Element::Mo,
    "Tc" => Element::Tc,
    "Ru" => Element::Ru,
    "Rh" => Element::Rh,
    "Pd" => Element::Pd,
    "Ag" => Element::Ag,
    "Cd" => Element::Cd,
    "In" => Element::In,
    "Sn" => Element::Sn,
    "Sb" => Element::Sb,
    "Te" => Element::Te,
    "I" => Element::I,
    "Xe" => Element::Xe,
};





impl Element
{
    /// Look up an element by its symbol. The symbol is case-insensitive ("CL", "cl", and "Cl" are all chlorine).
    ///
    /// # Examples
    /// ```
    /// use nequip_mm::common::constants::Element;
    /// assert_eq!(Element::from_symbol("CL"), Some(Element::Cl));
    /// ```
    pub fn from_symbol(symbol: &str) -> Option<Self>
    {
        let symbol: &str = symbol.trim();
        let mut chars = symbol.chars();
        let normalized: String = match chars.next()
        {
            Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
            None => return None,
        };
        SYMBOL_TO_ELEMENT.get(normalized.as_str()).copied()
    }

    pub fn atomic_number(&self) -> usize
    {
        *self as usize
    }

    pub fn symbol(&self) -> &'static str
    {
        ELEMENT_DATA[self.atomic_number() - 1].0
    }

    /// Standard atomic mass (Unit: amu)
    pub fn atomic_mass(&self) -> f64
    {
        ELEMENT_DATA[self.atomic_number() - 1].1
    }
}
