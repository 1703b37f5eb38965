macro_rules! impl_hex_debug {
    ($T:ident) => {
        impl core::fmt::Debug for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("0x")?;
                for b in self.0 {
                    f.write_fmt(format_args!("{:02x}", b))?;
                }
                Ok(())
            }
        }
    };
}

/// Fixed-size byte strings (`BytesN<N>` in the contract).
///
/// The length is part of the type, so the only places where a length
/// mismatch can show up are conversions from slices and decoding, both of
/// which return [crate::scval::Error::InvalidLength].
macro_rules! bytes_n {
    ( $(#[$meta:meta])* $T:ident, $N:literal ) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
        pub struct $T(pub [u8; $N]);

        impl $T {
            pub const LEN: usize = $N;

            pub fn as_bytes(&self) -> &[u8; $N] {
                &self.0
            }
        }

        impl serde::Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl rand::distributions::Distribution<$T> for rand::distributions::Standard {
            fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> $T {
                $T(rng.gen())
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self([0; $N])
            }
        }

        impl From<[u8; $N]> for $T {
            fn from(bytes: [u8; $N]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $T {
            type Error = $crate::scval::Error;

            fn try_from(value: &[u8]) -> core::result::Result<Self, Self::Error> {
                let bytes: [u8; $N] =
                    value
                        .try_into()
                        .map_err(|_| $crate::scval::Error::InvalidLength {
                            expected: $N,
                            found: value.len(),
                        })?;
                Ok(Self(bytes))
            }
        }

        impl AsRef<[u8]> for $T {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl $crate::wire::FromScVal for $T {
            fn from_scval(val: &$crate::scval::ScVal) -> $crate::scval::Result<Self> {
                match val {
                    $crate::scval::ScVal::Bytes(bytes) => Self::try_from(bytes.as_slice()),
                    other => Err($crate::scval::Error::unexpected("bytes", other)),
                }
            }
        }

        impl From<$T> for $crate::scval::ScVal {
            fn from(value: $T) -> Self {
                $crate::scval::ScVal::Bytes(value.0.to_vec())
            }
        }

        impl_hex_debug!($T);
    };
}
