//! Built-in room models for the reverb.
//!
//! Each preset lists its comb and allpass stages and the band the wet
//! signal is limited to. Comb delays stay below 250 ms and allpass delays
//! below 20 ms, the longest the network allocates for.
//!
//! `feedback` is a weighting, not a gain: the actual loop gains are derived
//! from it together with the decay time (see
//! [`comb_feedback_gain`](crate::dsp::comb::comb_feedback_gain)).

/// One comb stage of a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombSpec {
    /// Loop delay in seconds.
    pub delay_s: f32,
    /// Decay weighting. Larger values ring longer.
    pub feedback: f32,
    /// High-frequency absorption, 0 (bright) to 1 (dark).
    pub freq_resp: f32,
}

/// One allpass stage of a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllpassSpec {
    pub delay_s: f32,
    pub feedback: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbPreset {
    pub name: &'static str,
    pub combs: &'static [CombSpec],
    pub allpasses: &'static [AllpassSpec],
    /// Highpass corner of the output band, Hz.
    pub bandpass_low: f32,
    /// Lowpass corner of the output band, Hz.
    pub bandpass_high: f32,
}

const fn comb(delay_s: f32, feedback: f32, freq_resp: f32) -> CombSpec {
    CombSpec {
        delay_s,
        feedback,
        freq_resp,
    }
}

const fn allpass(delay_s: f32, feedback: f32) -> AllpassSpec {
    AllpassSpec { delay_s, feedback }
}

pub static PRESETS: &[ReverbPreset] = &[
    ReverbPreset {
        name: "Small Room",
        combs: &[
            comb(0.0213, 70.0, 0.45),
            comb(0.0257, 72.0, 0.40),
            comb(0.0291, 68.0, 0.50),
            comb(0.0317, 74.0, 0.35),
            comb(0.0343, 66.0, 0.55),
            comb(0.0379, 70.0, 0.45),
        ],
        allpasses: &[allpass(0.0051, 25.0), allpass(0.0017, 20.0)],
        bandpass_low: 120.0,
        bandpass_high: 7000.0,
    },
    ReverbPreset {
        name: "Medium Room",
        combs: &[
            comb(0.0297, 85.0, 0.35),
            comb(0.0371, 88.0, 0.30),
            comb(0.0411, 82.0, 0.40),
            comb(0.0437, 90.0, 0.25),
            comb(0.0467, 84.0, 0.35),
            comb(0.0503, 86.0, 0.30),
            comb(0.0541, 80.0, 0.45),
            comb(0.0577, 87.0, 0.30),
        ],
        allpasses: &[
            allpass(0.0089, 28.0),
            allpass(0.0050, 24.0),
            allpass(0.0017, 20.0),
        ],
        bandpass_low: 90.0,
        bandpass_high: 9000.0,
    },
    ReverbPreset {
        name: "Large Hall",
        combs: &[
            comb(0.0503, 110.0, 0.30),
            comb(0.0587, 115.0, 0.25),
            comb(0.0641, 108.0, 0.35),
            comb(0.0719, 118.0, 0.20),
            comb(0.0787, 112.0, 0.30),
            comb(0.0853, 106.0, 0.40),
            comb(0.0929, 116.0, 0.25),
            comb(0.1013, 110.0, 0.30),
            comb(0.1103, 104.0, 0.45),
            comb(0.1187, 114.0, 0.25),
        ],
        allpasses: &[
            allpass(0.0131, 35.0),
            allpass(0.0097, 32.0),
            allpass(0.0061, 28.0),
            allpass(0.0023, 22.0),
        ],
        bandpass_low: 60.0,
        bandpass_high: 10000.0,
    },
    ReverbPreset {
        name: "Cathedral",
        combs: &[
            comb(0.0811, 135.0, 0.35),
            comb(0.0937, 140.0, 0.30),
            comb(0.1049, 132.0, 0.40),
            comb(0.1187, 138.0, 0.30),
            comb(0.1301, 130.0, 0.45),
            comb(0.1453, 136.0, 0.30),
            comb(0.1597, 128.0, 0.50),
            comb(0.1733, 134.0, 0.35),
            comb(0.1889, 126.0, 0.50),
            comb(0.2011, 132.0, 0.40),
            comb(0.2203, 124.0, 0.55),
            comb(0.2389, 130.0, 0.45),
        ],
        allpasses: &[
            allpass(0.0179, 45.0),
            allpass(0.0137, 40.0),
            allpass(0.0101, 36.0),
            allpass(0.0067, 30.0),
            allpass(0.0031, 24.0),
        ],
        bandpass_low: 50.0,
        bandpass_high: 8000.0,
    },
    ReverbPreset {
        name: "Plate",
        combs: &[
            comb(0.0113, 95.0, 0.05),
            comb(0.0137, 98.0, 0.00),
            comb(0.0163, 92.0, 0.10),
            comb(0.0191, 100.0, 0.00),
            comb(0.0211, 94.0, 0.05),
            comb(0.0239, 97.0, 0.00),
            comb(0.0269, 91.0, 0.10),
            comb(0.0293, 99.0, 0.05),
        ],
        allpasses: &[
            allpass(0.0047, 30.0),
            allpass(0.0036, 28.0),
            allpass(0.0027, 25.0),
            allpass(0.0013, 20.0),
        ],
        bandpass_low: 200.0,
        bandpass_high: 14000.0,
    },
    ReverbPreset {
        name: "Cave",
        combs: &[
            comb(0.0613, 125.0, 0.70),
            comb(0.0829, 120.0, 0.75),
            comb(0.1097, 128.0, 0.65),
            comb(0.1381, 118.0, 0.80),
            comb(0.1699, 124.0, 0.70),
            comb(0.2087, 116.0, 0.85),
        ],
        allpasses: &[allpass(0.0191, 50.0), allpass(0.0113, 42.0)],
        bandpass_low: 40.0,
        bandpass_high: 4000.0,
    },
    ReverbPreset {
        name: "Bathroom",
        combs: &[
            comb(0.0097, 80.0, 0.00),
            comb(0.0119, 84.0, 0.05),
            comb(0.0131, 78.0, 0.00),
            comb(0.0149, 82.0, 0.05),
        ],
        allpasses: &[allpass(0.0029, 18.0), allpass(0.0011, 15.0)],
        bandpass_low: 250.0,
        bandpass_high: 12000.0,
    },
    ReverbPreset {
        name: "Ambience",
        combs: &[
            comb(0.0167, 60.0, 0.60),
            comb(0.0193, 62.0, 0.55),
            comb(0.0223, 58.0, 0.65),
            comb(0.0251, 61.0, 0.60),
            comb(0.0283, 57.0, 0.70),
            comb(0.0307, 63.0, 0.55),
            comb(0.0331, 59.0, 0.65),
            comb(0.0359, 60.0, 0.60),
            comb(0.0389, 56.0, 0.70),
            comb(0.0419, 62.0, 0.55),
            comb(0.0449, 58.0, 0.65),
            comb(0.0479, 60.0, 0.60),
            comb(0.0509, 57.0, 0.70),
            comb(0.0541, 61.0, 0.55),
            comb(0.0571, 59.0, 0.65),
            comb(0.0599, 60.0, 0.60),
            comb(0.0631, 56.0, 0.70),
            comb(0.0661, 62.0, 0.55),
            comb(0.0691, 58.0, 0.65),
            comb(0.0719, 60.0, 0.60),
        ],
        allpasses: &[
            allpass(0.0071, 22.0),
            allpass(0.0053, 20.0),
            allpass(0.0037, 18.0),
            allpass(0.0019, 15.0),
        ],
        bandpass_low: 150.0,
        bandpass_high: 6000.0,
    },
];

/// The preset for `mode`, clamped to the last one when out of range.
pub fn preset(mode: usize) -> &'static ReverbPreset {
    &PRESETS[mode.min(PRESETS.len() - 1)]
}
