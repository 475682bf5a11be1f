use crate::{Error, Value};

/// Parameters for one execution of an update statement. Positions start at `1` and correspond to
/// the `?` placeholders in the statement text.
///
/// Nothing is defaulted. Every position must be set, at least to an explicit `NULL` using
/// [`Self::set_null`], before the binding is accepted by [`crate::BatchExecutor::queue`].
///
/// Setters return `&mut Self` so calls can be chained:
///
/// ```
/// use mass_update::UpdateBinding;
///
/// let mut update = UpdateBinding::new(3);
/// update.set_text(1, "sonarqube")?.set_i64(2, 1_500_000_000_000)?.set(3, None::<i64>)?;
/// assert!(update.is_complete());
/// # Ok::<(), mass_update::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBinding {
    values: Vec<Option<Value>>,
}

impl UpdateBinding {
    /// An empty binding for a statement with `parameter_count` placeholders.
    pub fn new(parameter_count: u16) -> Self {
        Self {
            values: vec![None; usize::from(parameter_count)],
        }
    }

    pub fn parameter_count(&self) -> u16 {
        // Constructed from a `u16`, so this never truncates.
        self.values.len() as u16
    }

    /// Binds `value` to the placeholder at `position`. Binding the same position twice replaces
    /// the earlier value.
    pub fn set(&mut self, position: u16, value: impl Into<Value>) -> Result<&mut Self, Error> {
        let parameter_count = self.parameter_count();
        let slot = position
            .checked_sub(1)
            .and_then(|index| self.values.get_mut(usize::from(index)))
            .ok_or(Error::ParameterOutOfRange {
                position,
                parameter_count,
            })?;
        *slot = Some(value.into());
        Ok(self)
    }

    pub fn set_null(&mut self, position: u16) -> Result<&mut Self, Error> {
        self.set(position, Value::Null)
    }

    pub fn set_text(&mut self, position: u16, value: impl Into<String>) -> Result<&mut Self, Error> {
        self.set(position, Value::Text(value.into()))
    }

    pub fn set_i64(&mut self, position: u16, value: i64) -> Result<&mut Self, Error> {
        self.set(position, value)
    }

    pub fn set_i32(&mut self, position: u16, value: i32) -> Result<&mut Self, Error> {
        self.set(position, value)
    }

    pub fn set_f64(&mut self, position: u16, value: f64) -> Result<&mut Self, Error> {
        self.set(position, value)
    }

    pub fn set_bool(&mut self, position: u16, value: bool) -> Result<&mut Self, Error> {
        self.set(position, value)
    }

    pub fn set_bytes(&mut self, position: u16, value: impl Into<Vec<u8>>) -> Result<&mut Self, Error> {
        self.set(position, Value::Blob(value.into()))
    }

    /// `true` if every placeholder has been bound.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// The bound values in placeholder order. Fails with [`Error::UnboundParameter`] naming the
    /// first position which has not been set.
    pub fn into_parameters(self) -> Result<Vec<Value>, Error> {
        let parameter_count = self.parameter_count();
        self.values
            .into_iter()
            .zip(1..)
            .map(|(value, position)| {
                value.ok_or(Error::UnboundParameter {
                    position,
                    parameter_count,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateBinding;
    use crate::{Error, Value};

    #[test]
    fn unset_parameter_is_reported() {
        let mut binding = UpdateBinding::new(3);
        binding.set_text(1, "a").unwrap().set_text(3, "c").unwrap();

        assert!(!binding.is_complete());
        assert!(matches!(
            binding.into_parameters(),
            Err(Error::UnboundParameter {
                position: 2,
                parameter_count: 3
            })
        ));
    }

    #[test]
    fn explicit_null_counts_as_bound() {
        let mut binding = UpdateBinding::new(2);
        binding.set_null(1).unwrap().set(2, Some("x")).unwrap();

        let parameters = binding.into_parameters().unwrap();

        assert_eq!(vec![Value::Null, Value::from("x")], parameters);
    }

    #[test]
    fn position_zero_is_out_of_range() {
        let mut binding = UpdateBinding::new(1);

        assert!(matches!(
            binding.set_i64(0, 1),
            Err(Error::ParameterOutOfRange {
                position: 0,
                parameter_count: 1
            })
        ));
        assert!(matches!(
            binding.set_i64(2, 1),
            Err(Error::ParameterOutOfRange { position: 2, .. })
        ));
    }

    #[test]
    fn statement_without_placeholders_is_always_complete() {
        let binding = UpdateBinding::new(0);

        assert!(binding.is_complete());
        assert!(binding.into_parameters().unwrap().is_empty());
    }
}
