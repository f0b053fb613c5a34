//! Layering scenarios run by `strata demo`.
//!
//! Both scenarios build stacks out of small in-memory layers and print each
//! step, so the routing rules can be watched with `--log-level trace`.

use std::sync::{Arc, Mutex};

use strata_core::prelude::*;

/// Process-control layer that owns `wait` and `resume` but cannot attach.
fn process_layer() -> Layer
{
    Layer::builder("process")
        .longname("Process control")
        .implement(Op::Resume, |_, _| Ok(Reply::Unit))
        .implement(Op::Wait, |_, call| {
            let Call::Wait { ptid, .. } = call else {
                return Err(StrataError::InvalidArgument("expected wait".to_string()));
            };
            Ok(Reply::Waited {
                ptid,
                status: WaitStatus::Stopped(Signal::TRAP),
            })
        })
        .build()
}

/// Executable layer that knows how to attach.
fn exec_layer() -> Layer
{
    Layer::builder("exec")
        .longname("Local exec file")
        .implement(Op::Attach, |_, call| {
            let Call::Attach { args, .. } = call else {
                return Err(StrataError::InvalidArgument("expected attach".to_string()));
            };
            println!("    exec: attaching to {args}");
            Ok(Reply::Unit)
        })
        .build()
}

fn report<T: std::fmt::Debug>(step: &str, result: &StrataResult<T>)
{
    match result {
        Ok(value) => println!("  {step:<36} -> {value:?}"),
        Err(e) => println!("  {step:<36} -> error: {e}"),
    }
}

/// `attach` is found wherever it lives in the stack, and only while it is there.
///
/// ## Errors
///
/// Fails if a layer cannot be pushed or popped.
pub fn attach_scenario(config: &BaseConfig) -> StrataResult<()>
{
    println!("Attach search:");
    let mut stack = Stack::with_config(config);

    stack.push(process_layer())?;
    report("attach with [process]", &stack.attach("1234", false));
    report("wait with [process]", &stack.wait(Ptid::MINUS_ONE, WaitOptions::default()));

    stack.push(exec_layer())?;
    report("attach with [process, exec]", &stack.attach("1234", false));

    stack.pop()?;
    report("attach after popping exec", &stack.attach("1234", false));
    report("can_async_p", &stack.can_async_p());
    Ok(())
}

/// In-memory image backing the breakpoint scenario.
#[derive(Clone)]
struct MemoryImage
{
    base: Address,
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryImage
{
    fn new(base: Address, bytes: Vec<u8>) -> Self
    {
        Self {
            base,
            bytes: Arc::new(Mutex::new(bytes)),
        }
    }

    fn snapshot(&self) -> Vec<u8>
    {
        self.bytes.lock().map(|bytes| bytes.clone()).unwrap_or_default()
    }

    fn transfer(&self, request: &XferRequest) -> StrataResult<XferReply>
    {
        let mut bytes = self
            .bytes
            .lock()
            .map_err(|_| StrataError::backend("core", "memory image lock poisoned"))?;
        let offset = match request.offset.checked_sub(self.base.value()) {
            Some(offset) if (offset as usize) < bytes.len() => offset as usize,
            _ => return Ok(XferReply::io_error()),
        };
        let available = bytes.len() - offset;

        Ok(match &request.direction {
            XferDirection::Read => {
                let take = (request.len as usize).min(available);
                XferReply::read(bytes[offset..offset + take].to_vec())
            }
            XferDirection::Write(data) => {
                let take = data.len().min(available);
                bytes[offset..offset + take].copy_from_slice(&data[..take]);
                XferReply::written(take as u64)
            }
        })
    }

    /// Layer serving memory transfers from this image.
    fn layer(&self) -> Layer
    {
        let image = self.clone();
        Layer::builder("core")
            .longname("Core dump image")
            .implement(Op::XferPartial, move |this, call| {
                let Call::XferPartial(request) = call else {
                    return Err(StrataError::InvalidArgument("expected xfer_partial".to_string()));
                };
                if !request.object.is_memory() {
                    return this.call_beneath(Call::XferPartial(request));
                }
                image.transfer(&request).map(Reply::Xfer)
            })
            .build()
    }
}

/// A software breakpoint planted through the base layer's generic routine.
///
/// ## Errors
///
/// Fails if the breakpoint cannot be inserted or removed.
pub fn breakpoint_scenario(config: &BaseConfig) -> StrataResult<()>
{
    println!("Breakpoint through memory transfers ({}):", config.arch);
    let base = Address::new(0x40_1000);
    let image = MemoryImage::new(base, vec![0x55, 0x48, 0x89, 0xe5, 0x90, 0x90, 0x90, 0x90]);

    let mut stack = Stack::with_config(config);
    stack.push(image.layer())?;
    stack.push(Layer::new(LayerInfo::new("thread")))?;
    for layer in stack.layers() {
        println!("  layer {:<8} {}", layer.shortname(), layer.info().longname);
    }

    println!("  before: {:02x?}", image.snapshot());
    let placed = stack.insert_breakpoint(config.arch, BreakpointTarget::new(base))?;
    println!("  placed: {:02x?} (shadow {:02x?})", image.snapshot(), placed.shadow_contents);
    stack.remove_breakpoint(config.arch, placed)?;
    println!("  after:  {:02x?}", image.snapshot());

    report("region_ok_for_hw_watchpoint(8)", &stack.region_ok_for_hw_watchpoint(base, 8));
    report("region_ok_for_hw_watchpoint(64)", &stack.region_ok_for_hw_watchpoint(base, 64));
    report(
        "watchpoint_addr_within_range",
        &stack.watchpoint_addr_within_range(Address::new(0x40_1004), base, 8),
    );
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_attach_follows_the_exec_layer()
    {
        let mut stack = Stack::new();
        stack.push(process_layer()).unwrap();
        assert!(stack.attach("1", false).unwrap_err().is_unsupported());

        stack.push(exec_layer()).unwrap();
        assert_eq!(stack.attach("1", false), Ok(()));

        stack.pop().unwrap();
        assert!(stack.attach("1", false).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_breakpoint_scenario_restores_memory()
    {
        let config = BaseConfig::with_arch(Architecture::Arm64);
        assert_eq!(breakpoint_scenario(&config), Ok(()));
    }

    #[test]
    fn test_image_reports_io_error_outside_its_range()
    {
        let image = MemoryImage::new(Address::new(0x100), vec![1, 2, 3]);
        let reply = image
            .transfer(&XferRequest::read_memory(Address::new(0x200), 1))
            .unwrap();
        assert_eq!(reply, XferReply::io_error());

        let reply = image
            .transfer(&XferRequest::read_memory(Address::new(0x101), 8))
            .unwrap();
        assert_eq!(reply, XferReply::read(vec![2, 3]));
    }
}
