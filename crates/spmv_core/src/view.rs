//! Read-only f32 view over raw device-buffer bytes.
//!
//! Every place the harness reinterprets a byte buffer as float elements goes
//! through [`FloatView`], so bounds handling lives in one spot instead of at
//! each cast site.

use crate::Scalar;

const ELEM_SIZE: usize = std::mem::size_of::<Scalar>();

/// Borrowed view of a byte buffer as little-endian f32 elements.
///
/// A ragged tail shorter than one element is ignored.
#[derive(Debug, Clone, Copy)]
pub struct FloatView<'a> {
    bytes: &'a [u8],
}

impl<'a> FloatView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of whole elements in the buffer.
    pub fn len(&self) -> usize {
        self.bytes.len() / ELEM_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Scalar> {
        let start = index.checked_mul(ELEM_SIZE)?;
        let chunk = self.bytes.get(start..start + ELEM_SIZE)?;
        Some(Scalar::from_le_bytes(chunk.try_into().ok()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = Scalar> + 'a {
        self.bytes
            .chunks_exact(ELEM_SIZE)
            .map(|chunk| Scalar::from_le_bytes(chunk.try_into().unwrap()))
    }

    pub fn to_vec(&self) -> Vec<Scalar> {
        // The borrowed bytes usually sit in a Vec<u8> with no alignment
        // guarantee, so fall back to a per-element copy when bytemuck
        // refuses the cast.
        match bytemuck::try_cast_slice::<u8, Scalar>(
            &self.bytes[..self.len() * ELEM_SIZE],
        ) {
            Ok(slice) => slice.to_vec(),
            Err(_) => self.iter().collect(),
        }
    }
}

/// Serializes f32 elements into the byte layout device buffers use.
pub fn bytes_of_floats(values: &[Scalar]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}
