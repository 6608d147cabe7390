//! G.711 a-Law and mu-Law companding

const SIGN_BIT: u8 = 0x80;
const QUANT_MASK: u8 = 0x0f;
const SEG_SHIFT: u32 = 4;
const SEG_MASK: u8 = 0x70;

const BIAS: i16 = 0x84;
const CLIP: i16 = 8159;

const SEG_AEND: [i16; 8] = [0x1f, 0x3f, 0x7f, 0xff, 0x1ff, 0x3ff, 0x7ff, 0xfff];
const SEG_UEND: [i16; 8] = [0x3f, 0x7f, 0xff, 0x1ff, 0x3ff, 0x7ff, 0xfff, 0x1fff];

/// Index of the first segment whose end is not below `val`, or the table length
#[inline(always)]
fn segment(val: i16, table: &[i16; 8]) -> usize {
    table.iter().position(|&end| val <= end).unwrap_or(table.len())
}

/// Decode an a-Law byte to a 16 bit linear sample
#[inline]
pub fn alaw_to_linear16(a_val: u8) -> i16 {
    let a_val = a_val ^ 0x55;
    let mut t = i16::from(a_val & QUANT_MASK) << 4;
    let seg = u32::from((a_val & SEG_MASK) >> SEG_SHIFT);

    match seg {
        0 => t += 8,
        1 => t += 0x108,
        _ => {
            t += 0x108;
            t <<= seg - 1;
        }
    }

    if a_val & SIGN_BIT != 0 {
        t
    } else {
        -t
    }
}

/// Encode a 13 bit linear sample (range `-0x1000..=0xfff`) to a-Law
#[inline]
pub fn linear13_to_alaw(pcm_val: i16) -> u8 {
    let (mask, pcm_val) = if pcm_val >= 0 {
        (0xd5, pcm_val)
    } else {
        (0x55, -pcm_val - 1)
    };

    let seg = segment(pcm_val, &SEG_AEND);
    if seg >= 8 {
        return 0x7f ^ mask;
    }

    let mut aval = (seg as u8) << SEG_SHIFT;
    if seg < 2 {
        aval |= ((pcm_val >> 1) as u8) & QUANT_MASK;
    } else {
        aval |= ((pcm_val >> seg) as u8) & QUANT_MASK;
    }

    aval ^ mask
}

/// Decode a mu-Law byte to a 16 bit linear sample
#[inline]
pub fn ulaw_to_linear16(u_val: u8) -> i16 {
    let u_val = !u_val;
    let mut t = (i16::from(u_val & QUANT_MASK) << 3) + BIAS;
    t <<= (u_val & SEG_MASK) >> SEG_SHIFT;

    if u_val & SIGN_BIT != 0 {
        BIAS - t
    } else {
        t - BIAS
    }
}

/// Encode a 14 bit linear sample (range `-0x2000..=0x1fff`) to mu-Law
#[inline]
pub fn linear14_to_ulaw(pcm_val: i16) -> u8 {
    let (mask, pcm_val) = if pcm_val < 0 {
        (0x7f, pcm_val.saturating_neg())
    } else {
        (0xff, pcm_val)
    };

    let pcm_val = pcm_val.min(CLIP) + (BIAS >> 2);

    let seg = segment(pcm_val, &SEG_UEND);
    if seg >= 8 {
        return 0x7f ^ mask;
    }

    let uval = ((seg as u8) << 4) | (((pcm_val >> (seg + 1)) as u8) & QUANT_MASK);
    uval ^ mask
}
