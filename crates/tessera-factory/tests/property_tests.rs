//! Property-based tests for byte decoding

use proptest::prelude::*;
use tessera_factory::{Endianness, FactoryRegistry};
use tessera_tensor::packing::{pack_int4, pack_ternary};
use tessera_tensor::DType;

proptest! {
    #[test]
    fn test_fp32_decodes_in_either_byte_order(values in prop::collection::vec(-1e6f32..1e6, 1..=32)) {
        let registry = FactoryRegistry::with_defaults();
        let le: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let be: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();

        let a = registry.create_tensor_with(DType::Fp32, &[values.len()], &le, Endianness::Little).unwrap();
        let b = registry.create_tensor_with(DType::Fp32, &[values.len()], &be, Endianness::Big).unwrap();
        prop_assert_eq!(a.as_fp32().unwrap().to_vec(), values);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_packed_inputs_round_trip(
        int4 in prop::collection::vec(-8i8..=7, 1..=33),
        ternary in prop::collection::vec(-1i8..=1, 1..=33),
    ) {
        let registry = FactoryRegistry::with_defaults();

        let t = registry.create_tensor(DType::Int4, &[int4.len()], &pack_int4(&int4)).unwrap();
        prop_assert_eq!(t.into_int4().unwrap().to_vec(), int4);

        let t = registry.create_tensor(DType::Ternary, &[ternary.len()], &pack_ternary(&ternary)).unwrap();
        prop_assert_eq!(t.into_ternary().unwrap().to_vec(), ternary);
    }

    #[test]
    fn test_any_wrong_length_is_rejected(len in 0usize..64, volume in 1usize..16) {
        let registry = FactoryRegistry::with_defaults();
        for dtype in DType::ALL {
            let result = registry.create_tensor(dtype, &[volume], &vec![0x55; len]);
            prop_assert_eq!(result.is_ok(), Some(len) == dtype.expected_bytes(volume));
        }
    }
}
