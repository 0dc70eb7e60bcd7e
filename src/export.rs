//! CSV tabulation of layout and packing results.
//!
//! Every table starts with a header row; margin kinds are written by name.

use csv::WriterBuilder;

use crate::error::ExportError;
use crate::molecule::{ContactPosition, MarginBox, Pin};

/// Header of [`pins_csv`].
pub const PIN_HEADER: [&str; 3] = ["name", "x", "y"];

/// Header of [`margins_csv`].
pub const MARGIN_HEADER: [&str; 5] = ["kind", "center_x", "center_y", "width", "height"];

/// Header of [`contacts_csv`].
pub const CONTACT_HEADER: [&str; 5] = ["name", "x", "y", "margin", "grid_index"];

fn write_table<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
) -> Result<String, ExportError> {
    #[allow(unused_mut)]
    let mut builder = WriterBuilder::new();
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder = builder.terminator(Terminator::CRLF);
    }

    let mut wtr = builder.from_writer(Vec::new());
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    let bytes = wtr.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// Tabulates pins as `name,x,y`.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn pins_csv(pins: &[Pin]) -> Result<String, ExportError> {
    write_table(
        PIN_HEADER,
        pins.iter()
            .map(|p| [p.name.clone(), p.x.to_string(), p.y.to_string()]),
    )
}

/// Tabulates margins as `kind,center_x,center_y,width,height`.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn margins_csv(margins: &[MarginBox]) -> Result<String, ExportError> {
    write_table(
        MARGIN_HEADER,
        margins.iter().map(|m| {
            [
                m.kind.to_string(),
                m.center_x.to_string(),
                m.center_y.to_string(),
                m.width.to_string(),
                m.height.to_string(),
            ]
        }),
    )
}

/// Tabulates placed contacts as `name,x,y,margin,grid_index`.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn contacts_csv(contacts: &[ContactPosition]) -> Result<String, ExportError> {
    write_table(
        CONTACT_HEADER,
        contacts.iter().map(|c| {
            [
                c.name.clone(),
                c.x.to_string(),
                c.y.to_string(),
                c.margin.to_string(),
                c.grid_index.to_string(),
            ]
        }),
    )
}
