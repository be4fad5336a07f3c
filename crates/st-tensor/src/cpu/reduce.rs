// Axis kernels. The reduced axis is walked explicitly with its own stride;
// every other axis is walked by iterating the layout with that axis removed,
// which visits output slots in row-major order.

use crate::error::Result;
use crate::layout::Layout;

/// Layout of the input with `axis` fixed at 0, plus that axis' extent and stride.
fn split_axis(layout: &Layout, axis: usize) -> Result<(Layout, usize, usize)> {
    layout.shape().check_axis(axis)?;
    let len = layout.dims()[axis];
    let stride = layout.strides()[axis];
    if len == 0 {
        // No index can be fixed on an empty axis; only the outer shape matters.
        let outer = Layout::contiguous(layout.shape().remove_axis(axis)?);
        return Ok((outer, 0, stride));
    }
    Ok((layout.select(axis, 0)?, len, stride))
}

pub(crate) fn sum_axis(x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>> {
    layout.validate(x.len())?;
    let (outer, len, stride) = split_axis(layout, axis)?;
    Ok(outer
        .positions()
        .map(|base| (0..len).map(|k| x[base + k * stride]).sum::<f32>())
        .collect())
}

pub(crate) fn softmax_axis(x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>> {
    layout.validate(x.len())?;
    let (outer, len, stride) = split_axis(layout, axis)?;

    let out_layout = Layout::contiguous(layout.shape().clone());
    let mut out = vec![0.0f32; out_layout.elem_count()];
    if len == 0 {
        return Ok(out);
    }
    let (out_outer, _, out_stride) = split_axis(&out_layout, axis)?;

    for (base, out_base) in outer.positions().zip(out_outer.positions()) {
        // Subtract the max for numerical stability
        let max_val = (0..len)
            .map(|k| x[base + k * stride])
            .fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for k in 0..len {
            let e = (x[base + k * stride] - max_val).exp();
            out[out_base + k * out_stride] = e;
            sum += e;
        }

        for k in 0..len {
            out[out_base + k * out_stride] /= sum;
        }
    }
    Ok(out)
}
