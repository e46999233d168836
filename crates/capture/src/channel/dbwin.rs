//! Win32 transport speaking the `DBWIN` convention: two named auto-reset
//! events and one named 4096-byte file mapping, shared with arbitrary
//! producers on the machine.

use super::{BUFFER_SIZE, DebugTransport, RawDebugMessage, WaitOutcome};
use crate::Error;
use std::ffi::c_void;
use std::io;
use std::ptr;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE, WAIT_OBJECT_0};
use windows_sys::Win32::System::Memory::{
    CreateFileMappingA, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, PAGE_READWRITE,
    UnmapViewOfFile,
};
use windows_sys::Win32::System::Threading::{CreateEventA, INFINITE, SetEvent, WaitForSingleObject};

// Names are fixed by the OS convention; every OutputDebugString producer on
// the machine rendezvouses on them.
const DATA_READY_NAME: &[u8] = b"DBWIN_DATA_READY\0";
const BUFFER_READY_NAME: &[u8] = b"DBWIN_BUFFER_READY\0";
const BUFFER_NAME: &[u8] = b"DBWIN_BUFFER\0";

/// Owns the three named `DBWIN` objects for the lifetime of the process.
pub struct DbwinTransport {
    data_ready: HANDLE,
    buffer_ready: HANDLE,
    mapping: HANDLE,
    view: *const RawDebugMessage,
}

// The view pointer is only dereferenced by the thread driving the receive
// loop; the transport is moved there whole and never shared.
unsafe impl Send for DbwinTransport {}

impl DbwinTransport {
    /// Create the three named objects, or attach to them when another
    /// listener already made them (`CreateEventA`/`CreateFileMappingA` open
    /// the existing object for a taken name).
    pub fn open() -> Result<Self, Error> {
        let data_ready = unsafe { CreateEventA(ptr::null(), 0, 0, DATA_READY_NAME.as_ptr()) };
        if data_ready.is_null() {
            return Err(last_os_error());
        }

        let buffer_ready = unsafe { CreateEventA(ptr::null(), 0, 0, BUFFER_READY_NAME.as_ptr()) };
        if buffer_ready.is_null() {
            unsafe { CloseHandle(data_ready) };
            return Err(last_os_error());
        }

        let mapping = unsafe {
            CreateFileMappingA(
                INVALID_HANDLE_VALUE,
                ptr::null(),
                PAGE_READWRITE,
                0,
                BUFFER_SIZE as u32,
                BUFFER_NAME.as_ptr(),
            )
        };
        if mapping.is_null() {
            unsafe {
                CloseHandle(buffer_ready);
                CloseHandle(data_ready);
            }
            return Err(last_os_error());
        }

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0) };
        if view.Value.is_null() {
            unsafe {
                CloseHandle(mapping);
                CloseHandle(buffer_ready);
                CloseHandle(data_ready);
            }
            return Err(last_os_error());
        }

        Ok(Self {
            data_ready,
            buffer_ready,
            mapping,
            view: view.Value as *const RawDebugMessage,
        })
    }
}

impl DebugTransport for DbwinTransport {
    fn signal_buffer_ready(&mut self) -> Result<(), Error> {
        if unsafe { SetEvent(self.buffer_ready) } == 0 {
            return Err(last_os_error());
        }
        Ok(())
    }

    fn wait_data_ready(&mut self) -> Result<WaitOutcome, Error> {
        match unsafe { WaitForSingleObject(self.data_ready, INFINITE) } {
            WAIT_OBJECT_0 => Ok(WaitOutcome::Ready),
            _ => Err(last_os_error()),
        }
    }

    fn read_message(&mut self) -> RawDebugMessage {
        // Volatile copy out of producer-written shared memory; the section
        // itself is treated as read-only.
        unsafe { ptr::read_volatile(self.view) }
    }
}

impl Drop for DbwinTransport {
    fn drop(&mut self) {
        // Best-effort teardown; in normal operation this only runs at
        // process exit.
        unsafe {
            UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.view as *mut c_void,
            });
            CloseHandle(self.mapping);
            CloseHandle(self.buffer_ready);
            CloseHandle(self.data_ready);
        }
    }
}

fn last_os_error() -> Error {
    Error::OsResource(io::Error::last_os_error())
}
