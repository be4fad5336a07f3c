use std::fmt::{self, Write};

use crate::tensor::Tensor;

fn write_axis(
    f: &mut impl Write,
    values: &[f32],
    dims: &[usize],
    depth: usize,
) -> fmt::Result {
    let Some((&len, rest)) = dims.split_first() else {
        return write!(f, "{}", values[0]);
    };
    let chunk = rest.iter().product::<usize>();
    f.write_char('[')?;
    for i in 0..len {
        if i > 0 {
            if rest.is_empty() {
                f.write_str(", ")?;
            } else {
                f.write_str(",\n")?;
                for _ in 0..=depth {
                    f.write_char(' ')?;
                }
            }
        }
        write_axis(f, &values[i * chunk..(i + 1) * chunk], rest, depth + 1)?;
    }
    f.write_char(']')
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.to_vec().map_err(|_| fmt::Error)?;
        write_axis(f, &values, self.dims(), 0)?;
        write!(
            f,
            " shape={} dtype={} device={}",
            self.shape(),
            self.dtype(),
            self.device()
        )
    }
}

impl Tensor {
    /// Renders the tensor with every line prefixed by `prefix`.
    pub fn render(&self, prefix: &str) -> String {
        self.to_string()
            .lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use crate::shape::Shape;
    use crate::tensor::Tensor;

    #[test]
    fn test_display_matrix() {
        let t = Tensor::from_data(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        assert_eq!(
            t.to_string(),
            "[[1, 2],\n [3, 4]] shape=[2, 2] dtype=f32 device=cpu"
        );
    }

    #[test]
    fn test_display_view_uses_logical_order() {
        let t = Tensor::from_data(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let s = t.transpose().unwrap().to_string();
        assert!(s.starts_with("[[1, 3],\n [2, 4]]"));
    }

    #[test]
    fn test_display_scalar_and_empty() {
        assert!(Tensor::full(Shape::scalar(), 2.5).to_string().starts_with("2.5 "));
        assert!(Tensor::zeros([0]).to_string().starts_with("[] "));
    }

    #[test]
    fn test_render_prefix() {
        let t = Tensor::from_data(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let r = t.render("> ");
        assert!(r.lines().all(|l| l.starts_with("> ")));
        assert_eq!(r.lines().count(), 2);
    }
}
