//! Bound classes and the lower/upper clamp pairs applied to components after every step
use crate::configuration::ConfigError;
use crate::metabolic_model::component::Component;

/// Class of untagged components and of the `metabolite` tag
pub const METABOLITE_CLASS: usize = 0;
/// Class of the `enzyme` tag and its aliases
pub const ENZYME_CLASS: usize = 1;

/// Validated lower/upper clamp pairs, indexed by bound class
#[derive(Debug, Clone, PartialEq)]
pub struct BoundVector {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl BoundVector {
    /// Create a new BoundVector, one (lower, upper) pair per class
    ///
    /// # Returns
    /// - `Err` if the lists differ in length, hold a NaN, or any lower bound exceeds its upper bound
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, ConfigError> {
        if lower.len() != upper.len() {
            return Err(ConfigError::InvalidBoundConfiguration(format!(
                "{} lower bounds but {} upper bounds",
                lower.len(),
                upper.len()
            )));
        }
        for (class, (low, high)) in lower.iter().zip(upper.iter()).enumerate() {
            if low.is_nan() || high.is_nan() {
                return Err(ConfigError::InvalidBoundConfiguration(format!(
                    "bound class {} is NaN",
                    class
                )));
            }
            if low > high {
                return Err(ConfigError::InvalidBoundConfiguration(format!(
                    "bound class {} has lower bound {} above upper bound {}",
                    class, low, high
                )));
            }
        }
        Ok(BoundVector { lower, upper })
    }

    /// Parse semicolon delimited bound lists such as `"0;0"` and `"1e-3;1e-3"`
    pub fn parse(lower: &str, upper: &str) -> Result<Self, ConfigError> {
        BoundVector::new(parse_bound_list(lower)?, parse_bound_list(upper)?)
    }

    /// Number of bound classes
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// The (lower, upper) pair of `class`
    pub fn class(&self, class: usize) -> Option<(f64, f64)> {
        Some((*self.lower.get(class)?, *self.upper.get(class)?))
    }
}

/// Parse a semicolon delimited list of numbers
pub fn parse_bound_list(list: &str) -> Result<Vec<f64>, ConfigError> {
    list.split(';')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<f64>().map_err(|_| {
                ConfigError::InvalidBoundConfiguration(format!("unparseable bound {:?}", entry))
            })
        })
        .collect()
}

/// How a component's bound class tag resolves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundTag {
    /// Clamped with the pair of the given class
    Class(usize),
    /// Never clamped
    Unbounded,
    /// Tag names no known class
    Unknown,
}

impl BoundTag {
    /// Resolve a bound class tag, an untagged component belongs to the metabolite class
    pub fn resolve(tag: Option<&str>) -> BoundTag {
        let tag = match tag {
            None => return BoundTag::Class(METABOLITE_CLASS),
            Some(tag) => tag.trim().to_ascii_lowercase(),
        };
        match tag.as_str() {
            "unbounded" => BoundTag::Unbounded,
            "metabolite" => BoundTag::Class(METABOLITE_CLASS),
            "enzyme" | "peptide" | "protein" => BoundTag::Class(ENZYME_CLASS),
            other => match other.parse::<usize>() {
                Ok(class) => BoundTag::Class(class),
                Err(_) => BoundTag::Unknown,
            },
        }
    }
}

/// Clamp interval of `component`, or None if it is never clamped
///
/// A tag that resolves to no class present in `bounds` leaves the component unclamped.
pub fn component_bounds(component: &Component, bounds: &BoundVector) -> Option<(f64, f64)> {
    match BoundTag::resolve(component.bound_class.as_deref()) {
        BoundTag::Unbounded => None,
        BoundTag::Class(class) => {
            let pair = bounds.class(class);
            if pair.is_none() {
                log::warn!(
                    "Component {} has bound class {} but only {} classes are configured, leaving it unclamped",
                    component.id,
                    class,
                    bounds.len()
                );
            }
            pair
        }
        BoundTag::Unknown => {
            log::warn!(
                "Component {} has unknown bound class {:?}, leaving it unclamped",
                component.id,
                component.bound_class
            );
            None
        }
    }
}

#[cfg(test)]
mod bounds_tests {
    use super::*;
    use crate::metabolic_model::component::ComponentBuilder;

    fn tagged(tag: &str) -> Component {
        ComponentBuilder::default()
            .id("x".to_string())
            .bound_class(Some(tag.to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn parse_lists() {
        let bounds = BoundVector::parse("0;0", "1e-3; 2").unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds.class(0), Some((0., 1e-3)));
        assert_eq!(bounds.class(1), Some((0., 2.)));
        assert_eq!(bounds.class(2), None);
    }

    #[test]
    fn invalid_bounds() {
        for (lower, upper) in [("0;0", "1"), ("0;x", "1;1"), ("2", "1"), ("NaN", "1")] {
            assert!(
                matches!(
                    BoundVector::parse(lower, upper),
                    Err(ConfigError::InvalidBoundConfiguration(_))
                ),
                "{} {}",
                lower,
                upper
            );
        }
    }

    #[test]
    fn resolve_tags() {
        assert_eq!(BoundTag::resolve(None), BoundTag::Class(METABOLITE_CLASS));
        assert_eq!(BoundTag::resolve(Some("Enzyme")), BoundTag::Class(ENZYME_CLASS));
        assert_eq!(BoundTag::resolve(Some("protein")), BoundTag::Class(ENZYME_CLASS));
        assert_eq!(BoundTag::resolve(Some("3")), BoundTag::Class(3));
        assert_eq!(BoundTag::resolve(Some("UNBOUNDED")), BoundTag::Unbounded);
        assert_eq!(BoundTag::resolve(Some("lipid")), BoundTag::Unknown);
    }

    #[test]
    fn assign_component_bounds() {
        let bounds = BoundVector::new(vec![0., 0.], vec![10., 1.]).unwrap();
        assert_eq!(
            component_bounds(&Component::new("a", 1.), &bounds),
            Some((0., 10.))
        );
        assert_eq!(component_bounds(&tagged("enzyme"), &bounds), Some((0., 1.)));
        assert_eq!(component_bounds(&tagged("unbounded"), &bounds), None);
        assert_eq!(component_bounds(&tagged("5"), &bounds), None);
        assert_eq!(component_bounds(&tagged("lipid"), &bounds), None);
    }
}
