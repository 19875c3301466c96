use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa reserves id 1 for `<pad>`.
pub const PAD_TOKEN_ID: u32 = 1;

/// Encode `text` into fixed-length `(input_ids, attention_mask)` tensors of
/// shape `[1, max_len]`, truncating or right-padding as needed.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let (ids, mask) = pad_or_truncate(enc.get_ids(), enc.get_attention_mask(), max_len);
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

fn pad_or_truncate(ids: &[u32], mask: &[u32], max_len: usize) -> (Vec<u32>, Vec<u32>) {
    let mut ids: Vec<u32> = ids.iter().copied().take(max_len).collect();
    let mut mask: Vec<u32> = mask.iter().copied().take(max_len).collect();
    ids.resize(max_len, PAD_TOKEN_ID);
    mask.resize(max_len, 0);
    (ids, mask)
}

#[cfg(test)]
mod tests {
    use super::pad_or_truncate;

    #[test]
    fn pads_short_sequences_with_masked_pad_tokens() {
        let (ids, mask) = pad_or_truncate(&[0, 42, 2], &[1, 1, 1], 5);
        assert_eq!(ids, vec![0, 42, 2, 1, 1]);
        assert_eq!(mask, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn truncates_long_sequences() {
        let (ids, mask) = pad_or_truncate(&[0, 5, 6, 7, 2], &[1; 5], 3);
        assert_eq!(ids, vec![0, 5, 6]);
        assert_eq!(mask, vec![1, 1, 1]);
    }
}
