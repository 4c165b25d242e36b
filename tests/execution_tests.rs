mod common;

#[cfg(test)]
mod tests {
    use crate::common::{module_bytes, Func, FNOP};
    use rand::{Rng, SeedableRng};
    use std::thread;
    use wasmstack::parser::module::{Module, ValueType};
    use wasmstack::runtime::{RuntimeError, Value};
    use wasmstack::{create_vm, decode, ExecutionError, VmConfig};

    // local.get 0, local.get 1, i32.add, end
    const ADD: [u8; 6] = [0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b];

    fn run(module: &Module, config: &VmConfig) -> Result<Vec<Value>, ExecutionError> {
        let vm = create_vm(config).unwrap();
        vm.execute(module, config).map(|result| result.values)
    }

    fn arithmetic() -> Module {
        decode(
            &module_bytes(&[
                Func::new("add", 2, &ADD),
                // local.get 0, local.get 1, i32.sub, i32.const 3, i32.mul, end
                Func::new("sub_mul", 2, &[0x20, 0x00, 0x20, 0x01, 0x6b, 0x41, 0x03, 0x6c, 0x0b]),
                Func::new("trap", 0, &[0x01, 0x00, 0x0b]),
                Func::new("spin", 0, &[0x01; 64]),
            ])[..],
        )
        .unwrap()
    }

    #[test]
    fn test_fnop() {
        let module = decode(&FNOP[..]).unwrap();
        let vm = create_vm(&VmConfig::new("fnop")).unwrap();
        let result = vm.execute(&module, &VmConfig::new("fnop")).unwrap();
        assert!(result.values.is_empty());
        assert_eq!(result.instructions_executed, 3);
    }

    #[test]
    fn test_end_only_body() {
        let module = decode(&module_bytes(&[Func::new("fnop", 0, &[0x0b])])[..]).unwrap();
        assert!(run(&module, &VmConfig::new("fnop")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_function() {
        for module in [decode(&FNOP[..]).unwrap(), arithmetic(), Module::new("empty")] {
            for name in ["InvalidFunction", "", "FNOP", "fnop "] {
                let config = VmConfig {
                    start_function_name: name.to_string(),
                    ..VmConfig::default()
                };
                let vm = create_vm(&VmConfig::new("any")).unwrap();
                assert!(matches!(
                    vm.execute(&module, &config),
                    Err(ExecutionError::MissingFunction(n)) if n == name
                ));
            }
        }
    }

    #[test]
    fn test_wraparound() {
        let config = VmConfig::new("add").with_initial_stack_values(vec![0x7fffffff, 1]);
        let values = run(&arithmetic(), &config).unwrap();
        assert_eq!(values, vec![Value::I32(i32::MIN)]);
        assert_eq!(values[0].as_i32().map(|v| v as u32), Some(0x80000000));
    }

    #[test]
    fn test_sub_mul() {
        let config = VmConfig::new("sub_mul").with_initial_stack_values(vec![10, 4]);
        assert_eq!(run(&arithmetic(), &config).unwrap(), vec![Value::I32(18)]);
    }

    #[test]
    fn test_trap_reports_location() {
        match run(&arithmetic(), &VmConfig::new("trap")) {
            Err(ExecutionError::Fault {
                function_index: 2,
                cursor: 1,
                error: RuntimeError::Unreachable,
            }) => {}
            r => panic!("unexpected {r:?}"),
        }
    }

    #[test]
    fn test_instruction_budget() {
        let config = VmConfig::new("spin").with_max_instructions(10);
        let err = run(&arithmetic(), &config).unwrap_err();
        assert_eq!(err.runtime_error(), Some(&RuntimeError::InstructionBudgetExhausted));

        // without a budget the body simply runs off its end
        let err = run(&arithmetic(), &VmConfig::new("spin")).unwrap_err();
        assert_eq!(err.runtime_error(), Some(&RuntimeError::EndOfBytecode));
    }

    #[test]
    fn test_declared_locals() {
        let mut func = Func::new("locals", 1, &[0x20, 0x01, 0x20, 0x00, 0x22, 0x01, 0x6a, 0x0b]);
        func.locals = vec![ValueType::I32];
        let module = decode(&module_bytes(&[func])[..]).unwrap();
        let config = VmConfig::new("locals").with_initial_stack_values(vec![21]);
        assert_eq!(run(&module, &config).unwrap(), vec![Value::I32(21)]);
    }

    #[test]
    fn test_determinism() {
        let module = arithmetic();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a: i32 = rng.gen();
            let b: i32 = rng.gen();
            let config = VmConfig::new("add").with_initial_stack_values(vec![a, b]);
            let first = run(&module, &config).unwrap();
            let second = run(&module, &config).unwrap();
            assert_eq!(first, second);
            assert_eq!(first, vec![Value::I32(a.wrapping_add(b))]);
        }

        let first = run(&module, &VmConfig::new("trap")).unwrap_err();
        let second = run(&module, &VmConfig::new("trap")).unwrap_err();
        assert_eq!(first.runtime_error(), second.runtime_error());
    }

    #[test]
    fn test_concurrent_execution() {
        let module = arithmetic();
        let vm = create_vm(&VmConfig::new("add")).unwrap();

        thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let module = &module;
                    let vm = &vm;
                    s.spawn(move || {
                        (0..100)
                            .map(|j| {
                                let config = VmConfig::new("add").with_initial_stack_values(vec![i, j]);
                                vm.execute(module, &config).unwrap().values
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let results = handle.join().unwrap();
                for (j, values) in results.into_iter().enumerate() {
                    assert_eq!(values, vec![Value::I32((i + j) as i32)]);
                }
            }
        });
    }

    #[test]
    fn test_operands_do_not_reach_into_locals() {
        // drop, i32.const 9, end
        let module = decode(&module_bytes(&[Func::new("f", 1, &[0x1a, 0x41, 0x09, 0x0b])])[..]).unwrap();
        let config = VmConfig::new("f").with_initial_stack_values(vec![1]);
        match run(&module, &config) {
            Err(ExecutionError::Fault {
                function_index: 0,
                cursor: 0,
                error: RuntimeError::StackUnderflow,
            }) => {}
            r => panic!("unexpected {r:?}"),
        }
    }

    #[test]
    fn test_preload_mismatch_still_runs() {
        // one value for a two parameter function: local 1 is out of range
        let config = VmConfig::new("add").with_initial_stack_values(vec![1]);
        let err = run(&arithmetic(), &config).unwrap_err();
        assert_eq!(err.runtime_error(), Some(&RuntimeError::StackUnderflow));
    }
}
