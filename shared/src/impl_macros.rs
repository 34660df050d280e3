//! Contains convenience macros for type and message definitions

/// Implements safe (e.g. no panic) conversion of an enum to integer types and back
macro_rules! impl_enum_to_int {
    ($type:ty, $($variant:ident => $number:literal),+ $(,)?) => {
        impl_enum_to_int!(INT_VARIANT $type => u8, $($variant => $number),+);
        impl_enum_to_int!(INT_VARIANT $type => u16, $($variant => $number),+);
        impl_enum_to_int!(INT_VARIANT $type => u32, $($variant => $number),+);
    };

    (INT_VARIANT $type:ty => $int_type:ty, $($variant:ident => $number:literal),+) => {
        impl TryFrom<$int_type> for $type {
            type Error = ::anyhow::Error;
            fn try_from(value: $int_type) -> Result<Self, Self::Error> {
                match value {
                    $(
                        $number => Ok(Self::$variant),
                    )+
                    t => Err(::anyhow::anyhow!("Invalid enum value {t:#04x} for {}", stringify!($type))),
                }
            }
        }

        impl From<$type> for $int_type {
            fn from(value: $type) -> $int_type {
                match value {
                    $(
                        <$type>::$variant => $number,
                    )+
                }
            }
        }
    };
}

/// Implements [std::fmt::Display] and [std::str::FromStr] for an enum using the given user facing
/// strings.
macro_rules! impl_enum_user_str {
    ($type:ty, $($variant:path => $text:literal),+ $(,)?) => {
        impl $type {
            pub fn user_str(&self) -> &'static str {
                match self {
                    $(
                        $variant => $text,
                    )+
                }
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.user_str())
            }
        }

        impl std::str::FromStr for $type {
            type Err = ::anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $(
                        $text => Ok($variant),
                    )+
                    other => Err(::anyhow::anyhow!(
                        "'{other}' is not a valid {}", stringify!($type)
                    )),
                }
            }
        }
    };
}
