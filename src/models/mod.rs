pub mod booking;
pub mod role;
pub mod room;
pub mod user;

pub use booking::{
    ApprovalRequest, Booking, BookingDetail, BookingRequest, Decision, DetailStatus, LineItem,
    ReportRecipient, BOOKING_WINDOW_HOURS,
};
pub use role::{Identity, Role};
pub use room::{Facility, FacilityPatch, NewFacility, NewRoom, Room, RoomPatch, RoomStatus};
pub use user::{Credentials, NewUser, User, UserUpdate};
