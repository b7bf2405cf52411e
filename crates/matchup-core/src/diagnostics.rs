//! Time-axis diagnostics.
//!
//! Compares the acquisition time a reader's time locator reports per pixel
//! with the estimate of the scene's time axis at the pixel location.

use geometry::{Point, TimeAxis};
use matchup_common::{MatchupError, MatchupResult};

use crate::reader::{AcquisitionInfo, Reader, Window};

pub const LON_VARIABLE: &str = "lon";
pub const LAT_VARIABLE: &str = "lat";

/// Time axis covering `line`. Scenes with two axes switch to the second one
/// past mid-height.
pub fn axis_for_line(info: &AcquisitionInfo, line: i32, height: i32) -> Option<&TimeAxis> {
    if info.time_axes.len() > 1 && line > height / 2 {
        info.time_axes.get(1)
    } else {
        info.time_axes.first()
    }
}

/// Per-pixel difference in seconds between locator time and axis time along
/// one scan line. Pixels with fill geolocation or outside the axis are `None`.
pub fn time_differences(
    reader: &dyn Reader,
    info: &AcquisitionInfo,
    line: i32,
) -> MatchupResult<Vec<Option<f64>>> {
    let size = reader.product_size()?;
    if line < 0 || line >= size.ny {
        return Err(MatchupError::reader(format!(
            "line {} outside scene of {} lines",
            line, size.ny
        )));
    }
    let axis = axis_for_line(info, line, size.ny)
        .ok_or_else(|| MatchupError::reader("scene has no time axis"))?;
    let time_locator = reader.time_locator()?;

    let mut differences = Vec::with_capacity(size.nx as usize);
    for x in 0..size.nx {
        let lon = reader.read_raw(x, line, Window::center(), LON_VARIABLE)?;
        let lat = reader.read_raw(x, line, Window::center(), LAT_VARIABLE)?;
        let location = match (lon.center(), lat.center()) {
            (Some(lon_value), Some(lat_value)) if !lon.is_fill(lon_value) && !lat.is_fill(lat_value) => {
                Point::new(lon_value, lat_value)
            }
            _ => {
                differences.push(None);
                continue;
            }
        };

        let difference = axis.time(&location).map(|axis_time| {
            let locator_time = time_locator.time_for(x, line);
            (locator_time - axis_time.timestamp_millis()) as f64 / 1000.0
        });
        differences.push(difference);
    }
    Ok(differences)
}
