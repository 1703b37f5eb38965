use super::{ser::to_scval, xdr::to_writer, xdr::Writer, Result};

use serde::Serialize;
use sha2::{digest::Output, Digest, Sha256};

/// [Writer] feeding the XDR encoding straight into sha256.
#[derive(Default)]
pub struct Sha256Writer {
    hasher: Sha256,
}

impl Writer for Sha256Writer {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}

impl Sha256Writer {
    pub fn finalize(self) -> Output<Sha256> {
        self.hasher.finalize()
    }
}

/// sha256 over the XDR encoding of `value`.
pub fn to_hash<T>(value: &T) -> Result<[u8; 32]>
where
    T: Serialize + ?Sized,
{
    let mut writer = Sha256Writer::default();
    to_writer(&to_scval(value)?, &mut writer)?;
    Ok(writer.finalize().into())
}
