/// Declares a string-backed identifier newtype that serializes as a bare string.
#[macro_export]
macro_rules! string_key {
    ($TypeName: ident) => {
        #[derive(
            Clone,
            Debug,
            Default,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $TypeName(String);

        impl $TypeName {
            pub fn inner(&self) -> String {
                self.0.clone()
            }

            pub fn new(value: String) -> Self {
                $TypeName(value)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $TypeName {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl std::fmt::Display for $TypeName {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $TypeName {
            fn from(id: String) -> Self {
                $TypeName(id)
            }
        }

        impl From<&str> for $TypeName {
            fn from(id: &str) -> Self {
                $TypeName(id.to_owned())
            }
        }

        impl From<$TypeName> for String {
            fn from(id: $TypeName) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $TypeName {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Hash/Eq delegate to the inner String, so lookups by &str agree with lookups by id.
        impl std::borrow::Borrow<str> for $TypeName {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    string_key!(SampleId);

    #[test]
    fn test_string_key_serializes_as_a_bare_string() {
        let id = SampleId::from("PA15-A-15");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"PA15-A-15\"");
        let back: SampleId = serde_json::from_str("\"PA15-A-15\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_string_key_set_can_be_queried_with_str() {
        let ids: HashSet<SampleId> = ["a", "b"].into_iter().map(SampleId::from).collect();
        assert!(ids.contains("a"));
        assert!(!ids.contains("c"));
    }
}
