pub mod booking;

pub use booking::{
    Attendee, BookingArgs, BookingFieldsResponses, BookingRequest, InboundEnvelope, RideMetadata,
};
