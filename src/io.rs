//! Persisted terrain layout.
//!
//! The on-disk format is a fixed raw layout, all multi-byte values
//! big-endian:
//!
//! | field   | bytes                                  |
//! |---------|----------------------------------------|
//! | size    | `i32`                                  |
//! | heights | `(size + 1)²` packed `u16` samples     |
//! | blends  | `size²` RGBA8 pixels                   |
//!
//! Heights are stored in their packed fixed-point encoding and blends as the
//! raw RGBA8 backing, so a save/load round trip reconstructs bit-identical
//! rasters.

use crate::{data::TerrainData, error::TerrainError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Writes terrain data in the persisted layout.
pub fn save_terrain_data(data: &TerrainData, writer: &mut dyn Write) -> Result<(), TerrainError> {
    writer.write_i32::<BigEndian>(data.size())?;
    for &sample in data.heights().samples() {
        writer.write_u16::<BigEndian>(sample)?;
    }
    for pixel in data.blends().pixels() {
        writer.write_all(pixel)?;
    }
    Ok(())
}

/// Reads terrain data from the persisted layout. A stored size below 1 fails
/// with [`TerrainError::InvalidSize`]; truncated input surfaces as
/// [`TerrainError::Io`].
pub fn load_terrain_data(reader: &mut dyn Read) -> Result<TerrainData, TerrainError> {
    let size = reader.read_i32::<BigEndian>()?;
    let mut data = TerrainData::new(size)?;
    reader.read_u16_into::<BigEndian>(data.heights_mut().samples_mut())?;
    for pixel in data.blends_mut().pixels_mut() {
        reader.read_exact(pixel)?;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushMask;
    use std::io::Cursor;

    fn scribbled_terrain() -> TerrainData {
        let mut data = TerrainData::new(8).unwrap();
        for y in 0..=8 {
            for x in 0..=8 {
                data.heights_mut()
                    .set_height(x, y, (x as f32 * 1.7 + y as f32 * 0.3) % 4.0);
            }
        }
        data.paint_blend(&BrushMask::smooth_circle(5), 1, 1, 2, 0.8);
        data
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let data = scribbled_terrain();
        let mut bytes = Vec::new();
        save_terrain_data(&data, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 + 9 * 9 * 2 + 8 * 8 * 4);

        let loaded = load_terrain_data(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn samples_are_big_endian() {
        let mut data = TerrainData::new(1).unwrap();
        data.heights_mut().set_height(0, 0, 1.0); // raw 1000 = 0x03E8
        let mut bytes = Vec::new();
        save_terrain_data(&data, &mut bytes).unwrap();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..6], &[0x03, 0xE8]);
    }

    #[test]
    fn invalid_stored_size_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-3i32).to_be_bytes());
        assert!(matches!(
            load_terrain_data(&mut Cursor::new(bytes)),
            Err(TerrainError::InvalidSize(-3))
        ));
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let data = scribbled_terrain();
        let mut bytes = Vec::new();
        save_terrain_data(&data, &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(
            load_terrain_data(&mut Cursor::new(bytes)),
            Err(TerrainError::Io(_))
        ));
    }
}
