#![no_main]

use libfuzzer_sys::fuzz_target;

use wasmstack::parser::decode;
use wasmstack::parser::module::ExportKind;
use wasmstack::runtime::{create_vm, VmConfig};

fuzz_target!(|data: &[u8]| {
    // First, try to decode the module
    let module = match decode(data) {
        Ok(m) => m,
        Err(_) => return, // Invalid module, nothing to execute
    };
    let exports = match module.exports() {
        Some(exports) => exports,
        None => return,
    };

    // Invoke each exported function with a couple of arguments and a budget
    // so straight-line bodies can't run away
    for export in exports.exports.iter().filter(|e| e.kind == ExportKind::Function) {
        if export.name.is_empty() {
            continue;
        }
        let config = VmConfig::new(&export.name)
            .with_initial_stack_values(vec![1, -1])
            .with_max_instructions(10_000);
        let vm = create_vm(&config).expect("config is valid");
        let _ = vm.execute(&module, &config);
    }
});
