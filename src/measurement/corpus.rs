//! Bootstrap corpus of touch strokes.
//!
//! Twenty strokes from one reference owner and twenty from other people,
//! used to seed training before any local negatives exist.

use crate::core::feature_vector::{ClassLabel, FeatureVector};
use crate::core::features::NUM_STROKE_FEATURES;

/// Owner strokes.
#[rustfmt::skip]
pub const POSITIVE_STROKES: [[f64; NUM_STROKE_FEATURES]; 20] = [
    [868.0, 591.0, 891.0, 1611.0, 275.0, 1757.0, 1020.26, 0.02, 2.03, 4.62, 5.62, -0.07, -0.0, 0.23, 1.55, 6.46, 1022.37, 3.72, -0.2, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1019.34, 44.18, 430.0, 874.6, 0.02, -1.57, -3.96, -2.0, -1.98, 42.0],
    [800.0, 609.0, 826.0, 1629.0, 297.0, 659.0, 1020.33, 0.02, 1.62, 3.58, 5.21, -0.06, 0.0, 0.26, 1.55, 7.02, 1017.76, 3.43, -0.2, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1014.53, 69.33, 470.16, 875.0, 0.02, -1.57, -3.99, -2.01, -1.98, 0.0],
    [820.0, 615.0, 756.0, 1634.0, 275.0, 681.0, 1021.01, 0.02, 1.75, 4.25, 5.72, -0.16, 0.0, 0.09, 1.63, 8.37, 1023.73, 3.72, -0.88, 1.0, 0.02, 0.0, 1.0, 1.0, 0.0, 1020.7, 68.91, 465.0, 910.1, 0.02, -1.57, -3.88, -2.09, -1.98, 42.0],
    [866.0, 642.0, 822.0, 1555.0, 418.0, 824.0, 914.06, 0.02, 0.66, 2.64, 4.95, -0.07, -0.0, 0.06, 1.62, 8.04, 1095.94, 2.62, -0.26, 1.0, 0.02, 0.0, 1.0, 0.83, 3.14, 1017.9, 47.14, 471.14, 976.46, 0.02, -1.57, -3.49, -2.0, -1.98, 61.0],
    [781.0, 615.0, 759.0, 1652.0, 319.0, 615.0, 1037.23, 0.02, 1.8, 3.43, 5.38, -0.14, 0.01, 0.33, 1.59, 6.39, 1041.56, 3.27, -0.4, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1038.11, 51.57, 439.0, 902.14, 0.02, -1.57, -3.92, -2.06, -1.98, 48.0],
    [829.0, 541.0, 707.0, 1615.0, 363.0, 769.0, 1080.91, 0.02, 0.85, 2.99, 4.93, -0.06, 0.0, 0.12, 1.68, 6.08, 1118.39, 3.08, -0.28, 1.0, 0.02, 0.0, 1.0, 0.97, 3.14, 1085.0, 89.0, 584.09, 1042.0, 0.02, -1.57, -3.66, -2.01, -1.98, 53.0],
    [854.0, 569.0, 763.2, 1708.0, 342.0, 694.0, 1142.61, 0.02, 0.83, 3.62, 5.43, -0.1, 0.01, 0.19, 1.65, 6.46, 1165.83, 3.41, -0.35, 1.0, 0.02, 0.0, 1.0, 0.98, 3.14, 1139.0, 28.31, 437.0, 1006.4, 0.02, -1.57, -3.72, -2.0, -1.98, 51.0],
    [842.0, 538.0, 862.0, 1746.0, 274.0, 624.0, 1208.17, 0.02, 1.53, 5.47, 6.79, -0.03, 0.01, 0.14, 1.55, 8.28, 1201.86, 4.39, -0.43, 1.0, 0.02, 0.0, 1.0, 1.01, 3.14, 1197.17, 9.17, 367.0, 926.43, 0.02, -1.57, -3.77, -2.0, -1.98, 12.0],
    [824.0, 604.0, 787.0, 1682.0, 296.0, 681.0, 1078.63, 0.02, 1.51, 4.52, 5.83, -0.13, 0.01, 0.15, 1.61, 8.27, 1080.65, 3.65, -0.61, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1077.23, 51.0, 493.14, 959.0, 0.02, -1.57, -3.86, -2.0, -1.98, 45.0],
    [861.0, 526.0, 788.0, 1751.0, 329.0, 670.0, 1227.17, 0.02, 2.08, 4.07, 5.35, -0.09, 0.04, 0.19, 1.63, 6.18, 1228.98, 3.74, -0.32, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1224.15, 59.68, 511.21, 1053.36, 0.02, -1.57, -3.87, -2.0, -1.98, 50.0],
    [842.0, 638.0, 773.52, 1730.92, 258.0, 599.0, 1095.06, 0.03, 2.46, 4.71, 5.86, -0.08, 0.02, 0.22, 1.63, 6.4, 1085.69, 4.21, -0.18, 1.0, 0.02, 0.0, 1.0, 1.01, 3.14, 1081.0, 51.11, 423.06, 860.49, 0.02, -1.57, -3.82, -2.0, -1.98, 3.0],
    [816.0, 621.0, 773.0, 1733.41, 289.0, 668.0, 1113.24, 0.02, 2.18, 4.77, 5.53, -0.1, 0.0, 0.2, 1.61, 9.33, 1109.24, 3.84, -0.22, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1106.0, 38.2, 427.98, 897.96, 0.02, -1.57, -3.75, -2.0, -1.98, 43.0],
    [835.0, 592.0, 768.38, 1799.54, 299.0, 669.0, 1209.38, 0.02, 2.1, 4.9, 6.14, -0.04, 0.01, 0.16, 1.63, 6.6, 1208.05, 4.04, -0.12, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1203.0, 17.0, 446.17, 958.64, 0.02, -1.57, -3.78, -2.0, -1.98, 44.0],
    [875.0, 555.0, 808.0, 1667.0, 285.0, 678.0, 1114.02, 0.02, 1.75, 4.56, 5.88, -0.05, 0.01, 0.22, 1.63, 7.59, 1105.66, 3.88, -0.29, 1.0, 0.02, 0.0, 1.0, 1.01, 3.14, 1099.78, 36.8, 432.44, 925.87, 0.02, -1.57, -3.82, -2.0, -1.98, 43.0],
    [857.0, 549.0, 799.43, 1722.05, 290.0, 642.0, 1174.46, 0.02, 2.45, 4.65, 5.79, -0.09, 0.0, 0.13, 1.62, 7.14, 1168.86, 4.03, -0.53, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1162.0, 22.0, 415.54, 901.35, 0.02, -1.57, -3.76, -2.0, -1.98, 10.0],
    [850.0, 583.0, 816.02, 1736.88, 255.0, 668.0, 1154.38, 0.03, 3.01, 5.04, 6.09, -0.08, 0.0, 0.31, 1.6, 7.2, 1151.72, 4.52, -0.2, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1146.0, 33.41, 408.01, 884.41, 0.02, -1.57, -3.82, -2.0, -1.98, 38.0],
    [856.0, 624.0, 848.0, 1733.0, 231.0, 712.0, 1109.03, 0.03, 3.18, 5.75, 6.72, -0.06, 0.04, 0.31, 1.58, 7.92, 1093.97, 4.74, -0.11, 1.0, 0.02, 0.0, 1.0, 1.01, 3.14, 1081.23, 24.63, 357.26, 814.0, 0.02, -1.57, -3.8, -2.0, -1.98, 35.0],
    [869.0, 611.0, 799.07, 1708.77, 242.0, 692.0, 1099.99, 0.03, 3.05, 4.92, 6.1, -0.08, 0.0, 0.19, 1.63, 7.41, 1105.71, 4.57, -0.18, 1.0, 0.02, 0.0, 1.0, 0.99, 2.68, 1097.0, 53.63, 418.0, 871.54, 0.02, -2.03, -3.82, -2.0, -1.98, 36.0],
    [868.0, 648.0, 886.0, 1778.0, 253.0, 670.0, 1130.14, 0.03, 2.46, 4.77, 6.22, -0.11, 0.01, 0.23, 1.55, 7.17, 1133.39, 4.48, -0.34, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1125.22, 29.78, 355.52, 841.02, 0.02, -1.57, -3.86, -2.0, -1.98, 39.0],
    [882.0, 607.0, 791.0, 1712.0, 219.0, 626.0, 1108.74, 0.03, 2.4, 5.49, 7.24, -0.05, 0.08, 0.45, 1.65, 8.01, 1047.37, 4.78, -0.25, 1.0, 0.02, 0.0, 1.0, 1.06, 3.14, 1039.24, 33.27, 324.0, 751.8, 0.02, -1.57, -3.74, -2.0, -1.98, 33.0],
];

/// Strokes from other people.
#[rustfmt::skip]
pub const NEGATIVE_STROKES: [[f64; NUM_STROKE_FEATURES]; 20] = [
    [536.0, 612.0, 522.0, 1664.0, 285.0, 5243.0, 1052.09, 0.02, 1.83, 4.18, 5.65, -0.06, 0.02, 0.29, 1.58, 6.79, 1050.69, 3.69, -0.23, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1043.34, 46.2, 471.23, 895.8, 0.02, -1.57, -3.87, -2.0, -1.98, 43.0],
    [511.0, 534.0, 528.0, 1624.0, 319.0, 627.0, 1090.13, 0.02, 0.91, 4.11, 6.52, -0.11, 0.0, 0.09, 1.56, 8.38, 1103.53, 3.46, -0.3, 1.0, 0.02, 0.0, 1.0, 0.99, -2.36, 1090.0, 6.61, 407.0, 983.29, 0.02, -0.78, -3.65, -2.0, -1.98, 48.0],
    [480.0, 536.0, 479.0, 1582.0, 308.0, 626.0, 1046.0, 0.02, 1.28, 3.77, 5.82, -0.11, -0.0, 0.14, 1.57, 6.78, 1049.52, 3.41, -0.33, 1.0, 0.02, 0.0, 1.0, 1.0, 1.57, 1046.17, 96.38, 607.9, 992.93, 0.02, -3.14, -3.99, -2.1, -1.98, 46.0],
    [179.0, 843.0, 157.0, 1714.0, 176.0, 3972.0, 871.28, 0.04, 2.36, 5.39, 7.54, -0.2, -0.0, 0.08, 1.6, 8.23, 876.91, 4.98, -0.48, 1.0, 0.02, 0.0, 1.0, 0.99, 1.49, 869.94, 133.58, 566.0, 821.03, 0.02, -3.22, -3.97, -2.0, -1.98, 27.0],
    [175.0, 647.0, 158.16, 1720.31, 253.0, 615.0, 1073.44, 0.03, 2.28, 4.56, 6.33, -0.08, 0.03, 0.3, 1.59, 8.81, 1079.9, 4.27, -0.2, 1.0, 0.02, 0.0, 1.0, 0.99, 1.57, 1073.0, 76.34, 504.6, 949.03, 0.02, -3.14, -4.0, -2.0, -1.98, 38.0],
    [200.0, 640.0, 167.0, 1809.0, 264.0, 571.0, 1169.47, 0.03, 2.6, 5.18, 7.19, -0.16, -0.0, 0.4, 1.6, 8.57, 1171.31, 4.44, -0.27, 1.0, 0.02, 0.0, 1.0, 1.0, 3.14, 1166.81, 30.0, 499.75, 1027.0, 0.02, -1.57, -3.84, -2.0, -1.98, 40.0],
    [967.0, 1628.0, 177.0, 1657.0, 285.0, 2253.0, 790.53, 0.02, 0.56, 3.55, 6.09, -0.15, -0.0, 0.13, 3.1, 8.54, 912.36, 3.2, -0.61, 1.0, 0.02, 0.0, 2.0, 0.87, 3.14, 29.0, 1.82, 8.0, 23.4, 0.02, -1.57, -2.37, -2.0, -1.98, 44.0],
    [1004.0, 1629.0, 172.0, 1647.0, 318.0, 593.0, 832.19, 0.02, 0.77, 2.17, 4.97, -0.05, 0.0, 0.1, 3.12, 6.05, 852.41, 2.68, -0.34, 1.0, 0.02, 0.0, 2.0, 0.98, -2.68, 15.14, 3.48, 11.0, 13.06, 0.02, -1.11, -2.57, -1.99, -1.98, 48.0],
    [964.0, 1605.0, 203.0, 1594.0, 274.0, 648.0, 761.08, 0.02, 0.64, 3.22, 5.25, -0.07, 0.01, 0.09, -3.13, 5.89, 807.75, 2.95, -0.22, 1.0, 0.02, 0.0, 2.0, 0.94, 3.14, 11.0, 1.0, 5.0, 9.54, 0.02, -1.57, -2.3, -2.0, -1.98, 42.0],
    [951.0, 1616.0, 110.0, 1719.0, 285.0, 615.0, 847.28, 0.02, 0.94, 3.48, 5.6, -0.08, 0.0, 0.18, 3.02, 6.01, 894.34, 3.14, -0.24, 1.0, 0.02, 0.0, 2.0, 0.95, 3.14, 110.17, 5.75, 59.69, 108.13, 0.02, -1.57, -2.41, -2.0, -1.98, 43.0],
    [156.0, 488.0, 264.0, 1604.0, 352.0, 4356.0, 1121.21, 0.02, 2.12, 3.45, 5.35, -0.12, 0.02, 0.16, 1.47, 6.56, 1131.56, 3.21, -0.55, 1.0, 0.03, 0.0, 1.0, 0.99, 0.0, 1114.2, 74.18, 448.85, 938.47, 0.02, -1.57, -4.05, -2.0, -1.98, 53.0],
    [175.0, 583.0, 314.0, 1463.0, 351.0, 735.0, 890.91, 0.02, 0.55, 2.52, 4.16, -0.07, 0.01, 0.14, 1.41, 6.73, 910.14, 2.59, -0.37, 1.0, 0.03, 0.0, 1.0, 0.98, 0.0, 882.0, 14.43, 428.0, 823.88, 0.02, 1.57, -3.71, -2.0, -1.97, 53.0],
    [157.0, 607.0, 223.0, 1382.0, 352.0, 704.0, 777.81, 0.02, 0.41, 2.93, 4.71, -0.1, 0.0, 0.33, 1.49, 5.01, 801.49, 2.28, -0.43, 1.0, 0.03, 0.0, 1.0, 0.97, 0.0, 774.58, 78.59, 489.24, 763.8, 0.02, -1.57, -3.81, -2.0, -1.97, 51.0],
    [194.0, 1715.0, 934.0, 1705.0, 264.0, 1943.0, 740.07, 0.03, 0.71, 3.32, 4.84, -0.07, -0.0, 0.22, -0.01, 8.92, 744.97, 2.82, -0.29, 1.0, 0.02, 0.0, 3.0, 0.99, 0.0, 16.37, 2.0, 8.16, 14.59, 0.02, 1.57, -1.32, -2.0, -1.98, 40.0],
    [222.0, 1742.0, 934.15, 1696.28, 244.0, 563.0, 713.62, 0.03, 0.92, 3.67, 5.32, -0.15, 0.0, 0.31, -0.06, 6.7, 720.82, 2.95, -1.22, 1.0, 0.02, 0.0, 3.0, 0.99, 0.0, 47.0, 4.01, 28.64, 46.0, 0.02, 1.57, 0.17, -2.0, -1.98, 36.0],
    [149.0, 1727.0, 910.0, 1633.0, 274.0, 612.0, 766.78, 0.02, 0.88, 3.15, 4.75, -0.1, 0.02, 0.16, -0.12, 5.86, 768.04, 2.8, -0.23, 1.0, 0.02, 0.0, 3.0, 1.0, -0.79, 93.01, 10.45, 36.66, 82.84, 0.02, 0.78, 0.31, -1.97, -1.98, 41.0],
    [79.0, 1717.0, 905.0, 1704.0, 274.0, 626.0, 826.1, 0.02, 1.31, 3.43, 4.74, -0.12, -0.0, 0.1, -0.02, 8.59, 828.49, 3.02, -0.39, 1.0, 0.02, 0.0, 3.0, 1.0, -1.57, 16.0, 7.31, 10.0, 14.39, 0.02, 0.0, -0.97, -2.0, -1.98, 42.0],
    [949.0, 585.0, 797.0, 1457.0, 209.0, 112684116.0, 885.15, 0.03, 1.65, 5.29, 7.03, -0.05, 0.1, 0.55, 1.74, 8.05, 894.1, 4.28, -0.3, 1.0, 0.02, 0.0, 1.0, 0.99, 3.14, 859.71, 10.27, 223.0, 620.53, 0.02, -1.57, -3.65, -2.0, -1.98, 32.0],
    [882.0, 619.0, 795.0, 1496.0, 241.0, 736.0, 881.3, 0.03, 1.23, 4.48, 6.82, -0.06, 0.04, 0.42, 1.67, 7.78, 889.3, 3.69, -0.45, 1.0, 0.03, 0.0, 1.0, 0.99, -1.57, 862.5, 2.83, 170.21, 583.55, 0.03, 0.0, -3.66, -2.0, -1.98, 11.0],
    [908.0, 575.0, 779.31, 1409.2, 231.0, 814.0, 844.07, 0.03, 1.11, 4.36, 5.43, -0.03, 0.02, 0.31, 1.72, 6.44, 858.08, 3.71, -0.2, 1.0, 0.02, 0.0, 1.0, 0.98, 3.14, 832.0, 13.0, 228.27, 612.91, 0.02, -1.57, -3.65, -2.0, -1.98, 34.0],
];

fn to_vectors(rows: &[[f64; NUM_STROKE_FEATURES]], label: ClassLabel) -> Vec<FeatureVector> {
    rows.iter()
        .map(|row| FeatureVector::from_slice(row, label))
        .collect()
}

/// The owner strokes as positive samples.
pub fn positive_samples() -> Vec<FeatureVector> {
    to_vectors(&POSITIVE_STROKES, ClassLabel::Positive)
}

/// The strokes of other people as negative samples.
pub fn negative_samples() -> Vec<FeatureVector> {
    to_vectors(&NEGATIVE_STROKES, ClassLabel::Negative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_shape() {
        let pos = positive_samples();
        let neg = negative_samples();
        assert_eq!(pos.len(), 20);
        assert_eq!(neg.len(), 20);
        assert!(pos.iter().all(|fv| fv.label() == ClassLabel::Positive));
        assert!(neg.iter().all(|fv| fv.len() == NUM_STROKE_FEATURES));
        assert!(neg.iter().all(|fv| fv.label() == ClassLabel::Negative));
    }
}
