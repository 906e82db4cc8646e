//! Synthetic marker rasters, for printing, demos, and tests.

use chessar_core::GrayImage;

use crate::Dictionary;

/// Render a marker as a grayscale raster with a one-bit black border,
/// `cell_px` pixels per bit cell. Returns `None` for an id outside the
/// dictionary.
pub fn render_marker(dict: &Dictionary, id: u32, cell_px: usize) -> Option<GrayImage> {
    let code = *dict.codes.get(id as usize)?;
    let payload = dict.marker_size;
    let grid = payload + 2;
    let side = grid * cell_px;

    let mut img = GrayImage {
        width: side,
        height: side,
        data: vec![255u8; side * side],
    };

    for gy in 0..grid {
        for gx in 0..grid {
            let is_border = gx == 0 || gy == 0 || gx == grid - 1 || gy == grid - 1;
            let black = if is_border {
                true
            } else {
                let idx = (gy - 1) * payload + (gx - 1);
                (code >> idx) & 1 == 1
            };
            if !black {
                continue;
            }
            for y in gy * cell_px..(gy + 1) * cell_px {
                for x in gx * cell_px..(gx + 1) * cell_px {
                    img.set(x, y, 0);
                }
            }
        }
    }

    Some(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::dict_4x4_100;

    #[test]
    fn raster_has_black_border_and_expected_size() {
        let dict = dict_4x4_100();
        let img = render_marker(&dict, 0, 5).unwrap();
        assert_eq!(img.width, 30);
        assert_eq!(img.height, 30);
        for i in 0..img.width {
            assert_eq!(img.at(i, 0), 0);
            assert_eq!(img.at(0, i), 0);
            assert_eq!(img.at(i, img.height - 1), 0);
            assert_eq!(img.at(img.width - 1, i), 0);
        }
    }

    #[test]
    fn out_of_range_id_is_rejected() {
        let dict = dict_4x4_100();
        assert!(render_marker(&dict, dict.len() as u32, 5).is_none());
    }
}
