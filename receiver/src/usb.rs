//! USB front-end vendor protocol — spec §1 lists "the USB device driver" as
//! an external collaborator. This module defines only the vendor-request
//! constants and the trait boundary a real USB backend would implement;
//! the file-based [`crate::source::IfSource`] is what every current test
//! and the CLI binary actually drive samples through.

/// Vendor control-transfer requests a PocketSDR-family front end accepts
/// (device configuration, not implemented here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorRequest {
    SetSampleRate,
    SetGain,
    StartStreaming,
    StopStreaming,
}

/// Boundary trait a real USB backend (e.g. via `rusb`) would implement to
/// supply live IF samples instead of a file. Left unimplemented: the USB
/// device driver is out of this receiver's scope (spec §1).
pub trait UsbFrontEnd: Send {
    fn configure(&mut self, request: VendorRequest, value: u32) -> std::io::Result<()>;
    fn read_frame(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}
