//! `define_port_error!` generates the `thiserror` enums returned by driven
//! ports, plus a snake_case constructor per variant taking `impl Into<_>`
//! for each field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Unavailable => "target unavailable",
            Rejected { message: String } => "rejected: {message}",
            Lagging { seconds: u64 } => "lagging by {seconds}s",
            Partial { message: String, seconds: u64 } => "partial: {message} after {seconds}s",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::unavailable(), SamplePortError::Unavailable);
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::rejected("redis refused");
        assert_eq!(err.to_string(), "rejected: redis refused");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SamplePortError::lagging(42_u64);
        assert_eq!(err.to_string(), "lagging by 42s");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SamplePortError::partial("sweep", 3_u64);
        assert_eq!(err.to_string(), "partial: sweep after 3s");
    }
}
