//! Overload keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use arrow::datatypes::DataType as ArrowDataType;

use common_error::{QuarryError, QuarryResult};
use quarry_core::DataType;

/// Ordered parameter types of one function overload.
///
/// Parameter names are carried for display and for row views; two signatures
/// are equal iff their type lists are.
#[derive(Debug, Clone)]
pub struct Signature {
    types: Vec<DataType>,
    names: Option<Vec<String>>,
}

impl Signature {
    /// An unnamed signature.
    pub fn new(types: Vec<DataType>) -> Self {
        Self {
            types,
            names: None,
        }
    }

    /// A signature with named parameters.
    pub fn named<'a>(params: impl IntoIterator<Item = (&'a str, DataType)>) -> Self {
        let (names, types): (Vec<String>, Vec<DataType>) = params
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .unzip();
        Self {
            types,
            names: Some(names),
        }
    }

    /// The signature of a call whose arguments have the given Arrow types.
    pub fn from_arrow(types: &[&ArrowDataType]) -> QuarryResult<Self> {
        let types = types
            .iter()
            .map(|ty| {
                DataType::from_arrow(ty).ok_or_else(|| {
                    QuarryError::type_error(format!("no function argument type for {ty}"))
                })
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self::new(types))
    }

    /// Parameter types in order.
    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.types.len()
    }

    /// Parameter names; `arg0`, `arg1`, ... when none were given.
    pub fn param_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.types.len()).map(|i| format!("arg{i}")).collect(),
        }
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.types.hash(state);
    }
}

impl From<Vec<DataType>> for Signature {
    fn from(types: Vec<DataType>) -> Self {
        Self::new(types)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &self.names {
                Some(names) => write!(f, "{}: {ty}", names[i])?,
                None => write!(f, "{ty}")?,
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_names() {
        let named = Signature::named([("x", DataType::Float64)]);
        let bare = Signature::new(vec![DataType::Float64]);
        assert_eq!(named, bare);

        let set: HashSet<_> = [named, bare].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(
            Signature::new(vec![DataType::Int64]),
            Signature::new(vec![DataType::Int32])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Signature::new(vec![DataType::Int64, DataType::Utf8]).to_string(),
            "(Int64, Utf8)"
        );
        assert_eq!(
            Signature::named([("x", DataType::Float64)]).to_string(),
            "(x: Float64)"
        );
        assert_eq!(Signature::new(vec![]).to_string(), "()");
    }

    #[test]
    fn test_from_arrow() {
        let sig = Signature::from_arrow(&[&ArrowDataType::Float64, &ArrowDataType::LargeUtf8])
            .unwrap();
        assert_eq!(sig.types(), &[DataType::Float64, DataType::Utf8]);
        assert!(Signature::from_arrow(&[&ArrowDataType::Binary]).is_err());
        assert_eq!(sig.param_names(), vec!["arg0", "arg1"]);
    }
}
