#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Copy,
            Clone,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            postgres_types::ToSql,
            postgres_types::FromSql,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        #[postgres(transparent)]
        #[serde(transparent)] // JSON = plain UUID string
        pub struct $name(pub uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
            #[inline]
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(v: uuid::Uuid) -> Self {
                Self(v)
            }
        }
        impl From<$name> for uuid::Uuid {
            fn from(v: $name) -> uuid::Uuid {
                v.0
            }
        }
    };
}

define_id!(AccountId);

/// Random url-safe secret used for session tokens and auth codes.
pub fn random_token(len: usize) -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_and_display() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("nope".parse::<AccountId>().is_err());
    }

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let a = random_token(32);
        let b = random_token(32);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
