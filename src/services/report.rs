use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::models::Booking;

pub const HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Division",
    "Title",
    "Email",
    "RoomType",
    "BookingDate",
    "BookingDateEnd",
    "Status",
    "Description",
];

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row per booking detail, in booking order.
pub fn report_rows(bookings: &[Booking]) -> Vec<[String; 10]> {
    bookings
        .iter()
        .flat_map(|booking| {
            booking.booking_details.iter().map(move |detail| {
                [
                    booking.id.clone(),
                    booking.user.name.clone(),
                    booking.user.division.clone(),
                    booking.user.title.clone(),
                    booking.user.email.clone(),
                    detail.room.room_type.clone(),
                    detail.booking_date.format(DATE_FORMAT).to_string(),
                    detail.booking_date_end.format(DATE_FORMAT).to_string(),
                    detail.status.as_str().to_string(),
                    detail.description.clone(),
                ]
            })
        })
        .collect()
}

/// Lays the report out on `Sheet1`: a bold header row, then the detail rows.
fn build_workbook(bookings: &[Booking]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (row, fields) in report_rows(bookings).iter().enumerate() {
        for (col, value) in fields.iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, value)?;
        }
    }

    Ok(workbook)
}

pub fn render_xlsx(bookings: &[Booking]) -> Result<Vec<u8>, XlsxError> {
    build_workbook(bookings)?.save_to_buffer()
}

pub fn write_report(path: &Path, bookings: &[Booking]) -> Result<(), XlsxError> {
    build_workbook(bookings)?.save(path)
}
