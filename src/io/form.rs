//! Ordered form parameters for gateway requests
//!
//! The gateway is positionally sensitive: the serial number pair must come
//! first, primary before developer. [`FormParams`] keeps insertion order and
//! [`FormParams::identified`] seeds it with that pair.

use crate::config::GatewayConfig;
use url::form_urlencoded;

/// Naming scheme for the identification fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialFieldStyle {
    /// `SerialNumber` / `DeveloperSerialNumber` (authorize)
    Plain,
    /// `szSerialNumber` / `szDeveloperSerialNumber` (status, change status, close batch)
    Prefixed,
}

impl SerialFieldStyle {
    fn field_names(self) -> (&'static str, &'static str) {
        match self {
            SerialFieldStyle::Plain => ("SerialNumber", "DeveloperSerialNumber"),
            SerialFieldStyle::Prefixed => ("szSerialNumber", "szDeveloperSerialNumber"),
        }
    }
}

/// Ordered list of form key-value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a parameter list with the configured serial numbers
    pub fn identified(config: &GatewayConfig, style: SerialFieldStyle) -> Self {
        let (primary, developer) = style.field_names();
        FormParams::new()
            .with(primary, &config.serial_number)
            .with(developer, &config.developer_serial_number)
    }

    /// Append a pair, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Append every pair of `other`, keeping its order
    pub fn extend(&mut self, other: FormParams) {
        self.pairs.extend(other.pairs);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as an `application/x-www-form-urlencoded` body
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FormParams {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config() -> GatewayConfig {
        GatewayConfig::new("000111222333", "100200300400")
    }

    #[rstest]
    #[case::plain(SerialFieldStyle::Plain, "SerialNumber", "DeveloperSerialNumber")]
    #[case::prefixed(SerialFieldStyle::Prefixed, "szSerialNumber", "szDeveloperSerialNumber")]
    fn test_identified_puts_serials_first(
        #[case] style: SerialFieldStyle,
        #[case] primary: &str,
        #[case] developer: &str,
    ) {
        let mut params = FormParams::identified(&config(), style);
        params.extend(FormParams::new().with("OrderNumber", "5"));

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![primary, developer, "OrderNumber"]);
    }

    #[test]
    fn test_encode_preserves_order_and_escapes() {
        let params: FormParams = vec![("b", "2"), ("a", "x y&z")].into_iter().collect();
        assert_eq!(params.encode(), "b=2&a=x+y%26z");
    }

    #[test]
    fn test_get_returns_first_value() {
        let params = FormParams::new().with("k", "1").with("k", "2");
        assert_eq!(params.get("k"), Some("1"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
    }
}
