//! Host environment capabilities
//!
//! The monitor never talks to the operating system directly. Everything it
//! knows about the target process comes through these three traits, which
//! the Linux implementation in [`crate::symbolization`] provides for real
//! processes and tests provide with fakes.

use std::rc::Rc;
use std::sync::Arc;

use crate::domain::{Export, Module};

/// Supplies the ordered list of currently loaded modules
///
/// The first module is conventionally the process's main executable.
pub trait SnapshotProvider {
    fn modules(&self) -> Vec<Module>;
}

/// Enumerates the exports of a loaded module
///
/// Addresses in the returned exports are absolute runtime addresses.
pub trait ExportEnumerator {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export>;
}

/// Maps an absolute address to the name of the symbol covering it
pub trait AddressResolver {
    fn symbol_name_at(&self, address: u64) -> Option<String>;
}

impl SnapshotProvider for Vec<Module> {
    fn modules(&self) -> Vec<Module> {
        self.clone()
    }
}

impl SnapshotProvider for [Module] {
    fn modules(&self) -> Vec<Module> {
        self.to_vec()
    }
}

impl<T: ExportEnumerator + ?Sized> ExportEnumerator for Rc<T> {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export> {
        (**self).enumerate_exports(module)
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for Rc<T> {
    fn symbol_name_at(&self, address: u64) -> Option<String> {
        (**self).symbol_name_at(address)
    }
}

impl<T: ExportEnumerator + ?Sized> ExportEnumerator for Arc<T> {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export> {
        (**self).enumerate_exports(module)
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for Arc<T> {
    fn symbol_name_at(&self, address: u64) -> Option<String> {
        (**self).symbol_name_at(address)
    }
}

impl<T: ExportEnumerator + ?Sized> ExportEnumerator for Box<T> {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export> {
        (**self).enumerate_exports(module)
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for Box<T> {
    fn symbol_name_at(&self, address: u64) -> Option<String> {
        (**self).symbol_name_at(address)
    }
}
