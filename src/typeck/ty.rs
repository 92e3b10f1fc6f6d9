use std::fmt;

/// The closed set of primitive types. Values are compared by identity, so
/// there is no structural equivalence to speak of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Bool,
    Num,
    Word,
    List,
    Automation,
    Any,
    None,
}

impl Ty {
    pub const ALL: [Ty; 7] = [
        Ty::Bool,
        Ty::Num,
        Ty::Word,
        Ty::List,
        Ty::Automation,
        Ty::Any,
        Ty::None,
    ];

    /// Looks a type up by the name used for it in source text.
    pub fn from_name(name: &str) -> Option<Ty> {
        Ty::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ty::Bool => "bool",
            Ty::Num => "num",
            Ty::Word => "word",
            Ty::List => "list",
            Ty::Automation => "automation",
            Ty::Any => "any",
            Ty::None => "none",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Ty::Bool => "boolean",
            Ty::Num => "number",
            Ty::Word => "word",
            Ty::List => "list",
            Ty::Automation => "automation",
            Ty::Any => "any",
            Ty::None => "none",
        }
    }

    /// Every type is compatible with itself and with `any`, in either
    /// direction.
    pub fn is_compatible(&self, other: Ty) -> bool {
        *self == other || *self == Ty::Any || other == Ty::Any
    }

    /// Whether a slot declared with this type takes a value of type
    /// `actual`. Only an `any` slot widens.
    pub fn accepts(&self, actual: Ty) -> bool {
        *self == Ty::Any || *self == actual
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
