//! Lookup tables for the 3DO ADP4 and SDX2 codecs

/// ADP4 step size table (the standard IMA ADPCM progression).
#[rustfmt::skip]
pub static ADP4_STEP_SIZE: [i16; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17,
    19, 21, 23, 25, 28, 31, 34, 37, 41, 45,
    50, 55, 60, 66, 73, 80, 88, 97, 107, 118,
    130, 143, 157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358,
    5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// Highest valid index into [`ADP4_STEP_SIZE`].
pub const ADP4_MAX_STEP_INDEX: i16 = 88;

/// ADP4 step index adjustment, indexed by nibble.
#[rustfmt::skip]
pub static ADP4_STEP_INDEX_DELTA: [i16; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8,
    -1, -1, -1, -1, 2, 4, 6, 8,
];

/// SDX2 delta table: entry `i` is `2 * d * |d|` where `d = i - 128`.
#[rustfmt::skip]
pub static SDX2_SQUARE: [i16; 256] = [
    -32768, -32258, -31752, -31250, -30752, -30258, -29768, -29282, -28800, -28322,
    -27848, -27378, -26912, -26450, -25992, -25538, -25088, -24642, -24200, -23762,
    -23328, -22898, -22472, -22050, -21632, -21218, -20808, -20402, -20000, -19602,
    -19208, -18818, -18432, -18050, -17672, -17298, -16928, -16562, -16200, -15842,
    -15488, -15138, -14792, -14450, -14112, -13778, -13448, -13122, -12800, -12482,
    -12168, -11858, -11552, -11250, -10952, -10658, -10368, -10082,  -9800,  -9522,
     -9248,  -8978,  -8712,  -8450,  -8192,  -7938,  -7688,  -7442,  -7200,  -6962,
     -6728,  -6498,  -6272,  -6050,  -5832,  -5618,  -5408,  -5202,  -5000,  -4802,
     -4608,  -4418,  -4232,  -4050,  -3872,  -3698,  -3528,  -3362,  -3200,  -3042,
     -2888,  -2738,  -2592,  -2450,  -2312,  -2178,  -2048,  -1922,  -1800,  -1682,
     -1568,  -1458,  -1352,  -1250,  -1152,  -1058,   -968,   -882,   -800,   -722,
      -648,   -578,   -512,   -450,   -392,   -338,   -288,   -242,   -200,   -162,
      -128,    -98,    -72,    -50,    -32,    -18,     -8,     -2,      0,      2,
         8,     18,     32,     50,     72,     98,    128,    162,    200,    242,
       288,    338,    392,    450,    512,    578,    648,    722,    800,    882,
       968,   1058,   1152,   1250,   1352,   1458,   1568,   1682,   1800,   1922,
      2048,   2178,   2312,   2450,   2592,   2738,   2888,   3042,   3200,   3362,
      3528,   3698,   3872,   4050,   4232,   4418,   4608,   4802,   5000,   5202,
      5408,   5618,   5832,   6050,   6272,   6498,   6728,   6962,   7200,   7442,
      7688,   7938,   8192,   8450,   8712,   8978,   9248,   9522,   9800,  10082,
     10368,  10658,  10952,  11250,  11552,  11858,  12168,  12482,  12800,  13122,
     13448,  13778,  14112,  14450,  14792,  15138,  15488,  15842,  16200,  16562,
     16928,  17298,  17672,  18050,  18432,  18818,  19208,  19602,  20000,  20402,
     20808,  21218,  21632,  22050,  22472,  22898,  23328,  23762,  24200,  24642,
     25088,  25538,  25992,  26450,  26912,  27378,  27848,  28322,  28800,  29282,
     29768,  30258,  30752,  31250,  31752,  32258,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adp4_tables() {
        assert_eq!(ADP4_STEP_SIZE.len(), 89);
        assert_eq!(ADP4_STEP_SIZE[0], 7);
        assert_eq!(ADP4_STEP_SIZE[88], 32767);
        assert_eq!(ADP4_MAX_STEP_INDEX, 88);
        assert_eq!(ADP4_STEP_INDEX_DELTA.len(), 16);
        assert_eq!(ADP4_STEP_INDEX_DELTA[0], -1);
        assert_eq!(ADP4_STEP_INDEX_DELTA[7], 8);
    }

    #[test]
    fn test_step_size_monotonic() {
        assert!(ADP4_STEP_SIZE.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sdx2_square_formula() {
        for (i, &value) in SDX2_SQUARE.iter().enumerate() {
            let d = i as i32 - 128;
            assert_eq!(value as i32, 2 * d * d.abs(), "entry {}", i);
        }
    }

    #[test]
    fn test_sdx2_square_anchors() {
        assert_eq!(SDX2_SQUARE[0], -32768);
        assert_eq!(SDX2_SQUARE[128], 0);
        assert_eq!(SDX2_SQUARE[129], 2);
        assert_eq!(SDX2_SQUARE[255], 32258);
    }
}
