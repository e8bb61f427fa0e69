//! Macros for defining kind enums.

/// Macro for defining a kind enum.
///
/// Every variant carries its numeric storage representation and its
/// canonical textual form, used both for [`Display`] and parsing.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1 => "cube",
///
///         #[doc = "A sphere"]
///         Sphere = 2 => "sphere",
///     }
/// }
/// ```
///
/// [`Display`]: std::fmt::Display
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:literal => $repr:literal
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
        )]
        #[doc = $doc]
        #[repr(u8)]
        pub enum $name {
            $(
                #[doc = $variant_doc]
                #[strum(serialize = $repr)]
                #[cfg_attr(feature = "serde", serde(rename = $repr))]
                $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Returns the canonical textual form of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $repr, )*
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                match u8::try_from(
                    <i16 as $crate::private::postgres_types::FromSql<'_>>
                        ::from_sql(ty, raw)?,
                )? {
                    $(
                        v if Self::$variant.u8() == v => Ok(Self::$variant),
                    )*
                    v => Err(::std::format!(
                        "invalid `{}` value: {v}",
                        ::core::stringify!($name),
                    ).into()),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                $crate::private::postgres_types::ToSql::to_sql(
                    &i16::from(self.u8()),
                    ty,
                    w,
                )
            }
        }
    };
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    define_kind! {
        #[doc = "Test kind."]
        enum Shape {
            #[doc = "A cube."]
            Cube = 1 => "cube",

            #[doc = "A sphere."]
            Sphere = 2 => "Sphere",
        }
    }

    #[test]
    fn parses_exact_representation() {
        assert_eq!(Shape::from_str("cube").unwrap(), Shape::Cube);
        assert_eq!(Shape::from_str("Sphere").unwrap(), Shape::Sphere);
        assert!(Shape::from_str("CUBE").is_err());
        assert!(Shape::from_str("sphere").is_err());
    }

    #[test]
    fn displays_representation() {
        assert_eq!(Shape::Cube.to_string(), "cube");
        assert_eq!(Shape::Sphere.as_str(), "Sphere");
        assert_eq!(Shape::ALL, &[Shape::Cube, Shape::Sphere]);
        assert_eq!(Shape::Sphere.u8(), 2);
    }
}
