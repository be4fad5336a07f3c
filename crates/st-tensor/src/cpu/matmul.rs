use crate::error::{Result, TensorError};
use crate::layout::Layout;
use crate::shape::Shape;

/// Strided triple-loop matmul. Both operands are read through their own
/// strides and offset, so transposed views need no copy.
pub(crate) fn matmul_strided(
    a: &[f32],
    a_layout: &Layout,
    b: &[f32],
    b_layout: &Layout,
) -> Result<Vec<f32>> {
    for layout in [a_layout, b_layout] {
        if layout.ndim() != 2 {
            return Err(TensorError::UnsupportedRank {
                op: "matmul",
                expected: 2,
                got: layout.ndim(),
            });
        }
    }

    let (m, k) = (a_layout.dims()[0], a_layout.dims()[1]);
    let (k2, n) = (b_layout.dims()[0], b_layout.dims()[1]);
    if k != k2 {
        // Operand shapes as given; the inner axes are a's last and b's first.
        return Err(TensorError::ShapeMismatch {
            expected: a_layout.dims().to_vec(),
            got: b_layout.dims().to_vec(),
        });
    }
    a_layout.validate(a.len())?;
    b_layout.validate(b.len())?;

    let (sa0, sa1) = (a_layout.strides()[0], a_layout.strides()[1]);
    let (sb0, sb1) = (b_layout.strides()[0], b_layout.strides()[1]);
    let (oa, ob) = (a_layout.offset(), b_layout.offset());

    // With k == 0 the operands are empty, so m * n is not bounded by either.
    let mut c = vec![0.0f32; Shape::new(vec![m, n]).checked_numel()?];
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[oa + i * sa0 + p * sa1] * b[ob + p * sb0 + j * sb1];
            }
            c[i * n + j] = sum;
        }
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(dims: &[usize]) -> Layout {
        Layout::contiguous(Shape::from_slice(dims))
    }

    #[test]
    fn test_matmul_basic() {
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![5.0, 6.0, 7.0, 8.0];
        let c = matmul_strided(&a, &layout(&[2, 2]), &b, &layout(&[2, 2])).unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_rectangular() {
        // [1,2,3] @ [1;2;3] = [14]
        let a = vec![1.0, 2.0, 3.0];
        let c = matmul_strided(&a, &layout(&[1, 3]), &a, &layout(&[3, 1])).unwrap();
        assert_eq!(c, vec![14.0]);
    }

    #[test]
    fn test_matmul_transposed_operand() {
        // b holds [5,7;6,8] row-major; its transpose is [5,6;7,8]
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![5.0, 7.0, 6.0, 8.0];
        let bt = layout(&[2, 2]).transpose().unwrap();
        let c = matmul_strided(&a, &layout(&[2, 2]), &b, &bt).unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_inner_mismatch() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(
            matmul_strided(&a, &layout(&[1, 3]), &b, &layout(&[2, 2])).unwrap_err(),
            TensorError::ShapeMismatch {
                expected: vec![1, 3],
                got: vec![2, 2]
            }
        );
    }

    #[test]
    fn test_matmul_rank() {
        let a = vec![1.0, 2.0];
        assert!(matches!(
            matmul_strided(&a, &layout(&[2]), &a, &layout(&[2, 1])),
            Err(TensorError::UnsupportedRank { op: "matmul", .. })
        ));
    }
}
