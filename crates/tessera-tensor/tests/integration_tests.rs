//! Integration tests for tessera-tensor operations

use tessera_tensor::packing::{pack_int4, pack_ternary};
use tessera_tensor::quantization::{dequantize_int8_to_float, quantize_float_to_int8};
use tessera_tensor::prelude::*;
use tessera_tensor::{Int4Data, TernaryData};

fn fp32(values: Vec<f32>, dims: &[usize]) -> Tensor<Fp32Backend> {
    Tensor::from_vec(values, Shape::from_slice(dims).unwrap()).unwrap()
}

#[test]
fn test_comprehensive_fp32_pipeline() -> Result<()> {
    let a = fp32(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let b = fp32(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]);

    let c = a.matmul(&b)?;
    assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);

    let shifted = (&c - &fp32(vec![19.0, 22.0], &[1, 2]))?;
    assert_eq!(shifted.to_vec(), vec![0.0, 0.0, 24.0, 28.0]);

    let activated = shifted.sub_scalar(10.0f32)?.relu()?;
    assert_eq!(activated.to_vec(), vec![0.0, 0.0, 14.0, 18.0]);

    let probs = activated.softmax(1)?;
    for row in probs.to_vec().chunks(2) {
        assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }
    assert!(probs.get(&[1, 1])? > probs.get(&[1, 0])?);

    Ok(())
}

#[test]
fn test_broadcast_add_column_and_row() -> Result<()> {
    let col = fp32(vec![1.0, 2.0, 3.0], &[3, 1]);
    let row = fp32(vec![10.0, 20.0, 30.0, 40.0], &[1, 4]);
    let sum = (&col + &row)?;

    assert_eq!(sum.shape().dims(), &[3, 4]);
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(sum.get(&[i, j])?, col.get(&[i, 0])? + row.get(&[0, j])?);
        }
    }
    Ok(())
}

#[test]
fn test_incompatible_broadcast_is_shape_error() {
    let a = fp32(vec![0.0; 6], &[2, 3]);
    let b = fp32(vec![0.0; 4], &[4]);
    let err = a.add(&b).unwrap_err();
    assert!(err.is_shape_error());
}

#[test]
fn test_matmul4d_batched_and_channel_mix() -> Result<()> {
    // Two batches of identity times a counting matrix
    let identity = fp32(vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0], &[1, 2, 2, 2]);
    let counting = fp32((0..8).map(|v| v as f32).collect(), &[1, 2, 2, 2]);
    let out = identity.matmul4d(&counting)?;
    assert_eq!(out.shape().dims(), &[1, 2, 2, 2]);
    assert_eq!(out.to_vec(), counting.to_vec());

    // [B=1, Cin=2, H=1, W=2] x [Cin=2, Cout=1] sums the channels
    let input = fp32(vec![1.0, 2.0, 10.0, 20.0], &[1, 2, 1, 2]);
    let weights = fp32(vec![1.0, 1.0], &[2, 1]);
    let mixed = input.matmul4d(&weights)?;
    assert_eq!(mixed.shape().dims(), &[1, 1, 1, 2]);
    assert_eq!(mixed.to_vec(), vec![11.0, 22.0]);
    Ok(())
}

#[test]
fn test_integer_saturation_contract() -> Result<()> {
    let a = Tensor::<Int8Backend>::from_vec(vec![100, -100, 9], Shape::vector(3)?)?;
    let b = Tensor::<Int8Backend>::from_vec(vec![100, 100, 0], Shape::vector(3)?)?;
    assert_eq!((&a + &b)?.to_vec(), vec![127, 0, 9]);
    assert_eq!((&a * &b)?.to_vec(), vec![127, -128, 0]);
    assert_eq!((&a / &b)?.to_vec(), vec![1, -1, 0]);

    let big = Tensor::<Int32Backend>::from_vec(vec![i32::MAX, 7], Shape::vector(2)?)?;
    assert_eq!(big.add_scalar(1)?.to_vec(), vec![i32::MAX, 8]);
    assert_eq!(big.rdiv_scalar(14)?.to_vec(), vec![0, 2]);
    Ok(())
}

#[test]
fn test_packed_tensors_through_generic_backend() -> Result<()> {
    let values = vec![3, -5, 7, -8, 0];
    let storage = Int4Data::from_packed(pack_int4(&values), Shape::vector(5)?)?;
    let int4 = Tensor::<Int4Backend>::from_storage(storage);
    assert_eq!(int4.to_vec(), values);
    assert_eq!(int4.byte_len(), 3);
    assert_eq!(int4.scale(2.0)?.to_vec(), vec![6, -8, 7, -8, 0]);
    assert!(int4.add(&int4).unwrap_err().is_unsupported());

    let ternary_values = vec![1, -1, 0, 1, 1, -1];
    let storage = TernaryData::from_packed(pack_ternary(&ternary_values), Shape::matrix(2, 3)?)?;
    let ternary = Tensor::<TernaryBackend>::from_storage(storage);
    let product = ternary.matmul(&ternary.t()?)?;
    assert_eq!(product.shape().dims(), &[2, 2]);
    // [[2, 0], [0, 3]] clamped into {-1, 0, 1}
    assert_eq!(product.to_vec(), vec![1, 0, 0, 1]);
    Ok(())
}

#[test]
fn test_corrupt_ternary_bytes_rejected() {
    let err = TernaryData::from_packed(vec![0b0000_0011], Shape::vector(1).unwrap()).unwrap_err();
    assert!(err.is_decode_error());
}

#[test]
fn test_shape_ops_preserve_values() -> Result<()> {
    let x = fp32((0..24).map(|v| v as f32).collect(), &[2, 3, 4]);

    let flat = x.flatten(0, -1)?;
    assert_eq!(flat.shape().dims(), &[24]);

    let reshaped = x.reshape(&[4, -1])?;
    assert_eq!(reshaped.shape().dims(), &[4, 6]);
    assert_eq!(reshaped.flatten(0, -1)?, flat);

    let block = x.slice(&[1..2, 0..3, 2..4])?;
    assert_eq!(block.shape().dims(), &[1, 3, 2]);
    assert_eq!(block.to_vec(), vec![14.0, 15.0, 18.0, 19.0, 22.0, 23.0]);

    let m = fp32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    assert_eq!(m.t()?.t()?, m);
    Ok(())
}

#[test]
fn test_construction_size_mismatch() {
    let err = Tensor::<Fp32Backend>::from_vec(vec![0.0; 5], Shape::matrix(2, 3).unwrap()).unwrap_err();
    assert!(err.is_validation_error());

    let err = Int4Data::from_packed(vec![0; 2], Shape::vector(5).unwrap()).unwrap_err();
    assert!(err.is_validation_error());
}

#[test]
fn test_quantize_dequantize_round_trip() -> Result<()> {
    let x = fp32(vec![-1.0, -0.5, 0.0, 0.25, 1.0, 200.0], &[6]);
    let params = QuantizationParams::symmetric(1.0 / 127.0)?;
    let q = quantize_float_to_int8(&x, params)?;
    assert_eq!(q.to_vec(), vec![-127, -64, 0, 32, 127, 127]);

    let back = dequantize_int8_to_float(&q, params)?;
    for (orig, restored) in x.to_vec().iter().take(5).zip(back.to_vec()) {
        assert!((orig - restored).abs() <= params.scale / 2.0 + 1e-6);
    }
    Ok(())
}

#[test]
fn test_any_tensor_wraps_each_dtype() -> Result<()> {
    let shape = Shape::vector(4)?;
    let tensors: Vec<AnyTensor> = vec![
        Tensor::<Fp32Backend>::ones(shape.clone())?.into(),
        Tensor::<Fp16Backend>::ones(shape.clone())?.into(),
        Tensor::<Int32Backend>::ones(shape.clone())?.into(),
        Tensor::<Int8Backend>::ones(shape.clone())?.into(),
        Tensor::<Int4Backend>::ones(shape.clone())?.into(),
        Tensor::<TernaryBackend>::ones(shape)?.into(),
    ];

    let bytes: Vec<usize> = tensors.iter().map(AnyTensor::byte_len).collect();
    assert_eq!(bytes, vec![16, 8, 16, 4, 2, 1]);
    for t in &tensors {
        assert_eq!(t.to_f64_vec(), vec![1.0; 4]);
    }
    Ok(())
}
