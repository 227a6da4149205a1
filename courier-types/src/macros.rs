#[macro_export]
/// Generate `deser_courier_{uint}` permissive deserializers
macro_rules! impl_deser_courier_number {
    ($($u:ident),*) => {
        $(affix::paste! {
            #[doc = "Permissive deserialization of numbers. Allows numbers, hex strings, and decimal strings"]
            pub fn [<deser_courier_ $u>]<'de, D>(deserializer: D) -> Result<$u, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct NumberOrNumberStringVisitor;

                impl<'de> serde::de::Visitor<'de> for NumberOrNumberStringVisitor {
                    type Value = $u;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        formatter
                            .write_str("a non-negative integer, a decimal string, or a 0x-prefixed hex string")
                    }

                    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        v.try_into().map_err(|_| {
                            E::invalid_value(serde::de::Unexpected::Unsigned(v), &self)
                        })
                    }

                    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        let trimmed = v.trim();
                        let parsed = match trimmed
                            .strip_prefix("0x")
                            .or_else(|| trimmed.strip_prefix("0X"))
                        {
                            Some("") => Ok(0),
                            Some(hex) => $u::from_str_radix(hex, 16),
                            None => trimmed.parse(),
                        };
                        parsed.map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
                    }
                }

                deserializer.deserialize_any(NumberOrNumberStringVisitor)
            }
        })*
    };
}
