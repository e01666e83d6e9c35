//! Storage security transport and stall seams.
//!
//! [`StorageSecurityCommand`] is the interface the library drives; it mirrors the `SendData` / `ReceiveData` pair of
//! the UEFI `EFI_STORAGE_SECURITY_COMMAND_PROTOCOL`. [`EfiStorageSecurityCommand`] adapts an installed instance of
//! that protocol, and [`BootServicesStall`] adapts the boot services `Stall()` call.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use core::ffi::c_void;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use r_efi::efi;

/// `EFI_STORAGE_SECURITY_COMMAND_PROTOCOL_GUID`
pub const PROTOCOL_GUID: efi::Guid =
    efi::Guid::from_fields(0xC88B0B6D, 0x0DFC, 0x49A7, 0x9C, 0xB4, &[0x49, 0x07, 0x4B, 0x4C, 0x3A, 0x78]);

pub type ReceiveData = extern "efiapi" fn(
    this: *mut Protocol,
    media_id: u32,
    timeout: u64,
    security_protocol_id: u8,
    security_protocol_specific_data: u16,
    payload_buffer_size: usize,
    payload_buffer: *mut c_void,
    payload_transfer_size: *mut usize,
) -> efi::Status;

pub type SendData = extern "efiapi" fn(
    this: *mut Protocol,
    media_id: u32,
    timeout: u64,
    security_protocol_id: u8,
    security_protocol_specific_data: u16,
    payload_buffer_size: usize,
    payload_buffer: *mut c_void,
) -> efi::Status;

/// `EFI_STORAGE_SECURITY_COMMAND_PROTOCOL` interface layout.
#[repr(C)]
pub struct Protocol {
    pub receive_data: ReceiveData,
    pub send_data: SendData,
}

/// Security protocol transport of a storage device.
///
/// `security_protocol_specific` is passed through unchanged; callers are responsible for its byte order.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait StorageSecurityCommand {
    /// Sends `payload` to the security subsystem of the device.
    ///
    /// `timeout` is forwarded to the device unchanged, 0 waits indefinitely.
    fn send_data(
        &self,
        media_id: u32,
        timeout: u64,
        security_protocol_id: u8,
        security_protocol_specific: u16,
        payload: &[u8],
    ) -> Result<(), efi::Status>;

    /// Receives data from the security subsystem into `payload` and returns the number of bytes transferred.
    fn receive_data(
        &self,
        media_id: u32,
        timeout: u64,
        security_protocol_id: u8,
        security_protocol_specific: u16,
        payload: &mut [u8],
    ) -> Result<usize, efi::Status>;
}

/// Busy wait provider used between receive polls.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait Stall {
    fn stall(&self, microseconds: usize);
}

/// [`StorageSecurityCommand`] over an installed `EFI_STORAGE_SECURITY_COMMAND_PROTOCOL` instance.
pub struct EfiStorageSecurityCommand<'a> {
    protocol: &'a Protocol,
}

impl<'a> EfiStorageSecurityCommand<'a> {
    pub fn new(protocol: &'a Protocol) -> Self {
        Self { protocol }
    }

    fn this(&self) -> *mut Protocol {
        self.protocol as *const Protocol as *mut Protocol
    }
}

impl StorageSecurityCommand for EfiStorageSecurityCommand<'_> {
    fn send_data(
        &self,
        media_id: u32,
        timeout: u64,
        security_protocol_id: u8,
        security_protocol_specific: u16,
        payload: &[u8],
    ) -> Result<(), efi::Status> {
        let status = (self.protocol.send_data)(
            self.this(),
            media_id,
            timeout,
            security_protocol_id,
            security_protocol_specific,
            payload.len(),
            payload.as_ptr() as *mut c_void,
        );
        if status.is_error() {
            log::debug!(target: "tcg_opal", "SendData({:#04X}, {:#06X}) failed: {:#x?}", security_protocol_id, security_protocol_specific, status);
            return Err(status);
        }
        Ok(())
    }

    fn receive_data(
        &self,
        media_id: u32,
        timeout: u64,
        security_protocol_id: u8,
        security_protocol_specific: u16,
        payload: &mut [u8],
    ) -> Result<usize, efi::Status> {
        let mut transfer_size = 0_usize;
        let status = (self.protocol.receive_data)(
            self.this(),
            media_id,
            timeout,
            security_protocol_id,
            security_protocol_specific,
            payload.len(),
            payload.as_mut_ptr() as *mut c_void,
            &mut transfer_size,
        );
        if status.is_error() {
            log::debug!(target: "tcg_opal", "ReceiveData({:#04X}, {:#06X}) failed: {:#x?}", security_protocol_id, security_protocol_specific, status);
            return Err(status);
        }
        Ok(transfer_size.min(payload.len()))
    }
}

/// [`Stall`] backed by the boot services `Stall()` call.
pub struct BootServicesStall<'a> {
    boot_services: &'a efi::BootServices,
}

impl<'a> BootServicesStall<'a> {
    pub fn new(boot_services: &'a efi::BootServices) -> Self {
        Self { boot_services }
    }
}

impl Stall for BootServicesStall<'_> {
    fn stall(&self, microseconds: usize) {
        let status = (self.boot_services.stall)(microseconds);
        if status.is_error() {
            log::trace!(target: "tcg_opal", "Stall({}) returned {:#x?}", microseconds, status);
        }
    }
}
