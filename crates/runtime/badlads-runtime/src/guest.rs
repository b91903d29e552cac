//! Host side of the owned-buffer protocol.

use crate::host::StoreData;
use crate::metrics;
use anyhow::{anyhow, Context, Result};
use badlads_host_abi::MemoryExport;
use wasmtime::{AsContext, AsContextMut, Caller, Instance, Memory, Store, TypedFunc};

/// A plugin's linear memory and allocator exports.
#[derive(Clone)]
pub struct GuestMemory {
    memory: Memory,
    new: TypedFunc<(i32, i32), i32>,
    pin: TypedFunc<i32, i32>,
    unpin: TypedFunc<i32, ()>,
}

impl GuestMemory {
    pub fn from_instance(instance: &Instance, store: &mut Store<StoreData>) -> Result<Self> {
        let memory = instance
            .get_memory(&mut *store, MemoryExport::MEMORY)
            .ok_or_else(|| anyhow!("memory export not found"))?;
        Ok(Self {
            memory,
            new: instance.get_typed_func(&mut *store, MemoryExport::New.export_name())?,
            pin: instance.get_typed_func(&mut *store, MemoryExport::Pin.export_name())?,
            unpin: instance.get_typed_func(&mut *store, MemoryExport::Unpin.export_name())?,
        })
    }

    pub fn from_caller(caller: &mut Caller<'_, StoreData>) -> Result<Self> {
        let memory = caller_memory(caller)?;
        Ok(Self {
            memory,
            new: caller_func(caller, MemoryExport::New)?,
            pin: caller_func(caller, MemoryExport::Pin)?,
            unpin: caller_func(caller, MemoryExport::Unpin)?,
        })
    }

    /// Hands `bytes` to the guest: `__new`, write, `__pin`. Returns the pinned pointer.
    ///
    /// If the write fails the allocation is released with `__unpin` before the error
    /// is returned, so the guest never sees a half-written buffer.
    pub fn write_owned(&self, mut store: impl AsContextMut, bytes: &[u8], class_id: u32) -> Result<i32> {
        let len = i32::try_from(bytes.len()).context("owned buffer does not fit in guest memory")?;
        let class_id = i32::try_from(class_id).context("class id out of range")?;
        let ptr = self.new.call(&mut store, (len, class_id))?;
        if ptr == 0 {
            return Err(anyhow!("guest allocator returned null for {len} bytes"));
        }
        if let Err(e) = self.memory.write(&mut store, offset(ptr), bytes) {
            self.unpin.call(&mut store, ptr)?;
            return Err(anyhow!("owned buffer at {ptr:#x} out of bounds: {e}"));
        }
        let pinned = self.pin.call(&mut store, ptr)?;
        metrics::record_owned_buffer_written();
        Ok(pinned)
    }

    pub fn read_text(&self, store: impl AsContext, ptr: i32, len: i32) -> Result<String> {
        read_text(&self.memory, store, ptr, len)
    }
}

/// Reads guest→host text. A trailing NUL terminator is not part of the text.
pub fn read_text(memory: &Memory, store: impl AsContext, ptr: i32, len: i32) -> Result<String> {
    let len = usize::try_from(len).map_err(|_| anyhow!("negative text length {len}"))?;
    let mut bytes = vec![0u8; len];
    memory
        .read(&store, offset(ptr), &mut bytes)
        .map_err(|e| anyhow!("guest text at {ptr:#x}+{len} out of bounds: {e}"))?;
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8(bytes).context("guest text is not valid UTF-8")
}

pub fn caller_memory(caller: &mut Caller<'_, StoreData>) -> Result<Memory> {
    caller
        .get_export(MemoryExport::MEMORY)
        .and_then(|export| export.into_memory())
        .ok_or_else(|| anyhow!("memory export not found"))
}

fn caller_func<P, R>(caller: &mut Caller<'_, StoreData>, export: MemoryExport) -> Result<TypedFunc<P, R>>
where
    P: wasmtime::WasmParams,
    R: wasmtime::WasmResults,
{
    let func = caller
        .get_export(export.export_name())
        .and_then(|export| export.into_func())
        .ok_or_else(|| anyhow!("{} export not found", export.export_name()))?;
    func.typed::<P, R>(&*caller)
}

/// Guest pointers are i32 on the wire and unsigned in linear memory.
fn offset(ptr: i32) -> usize {
    ptr as u32 as usize
}
