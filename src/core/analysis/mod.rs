mod class_counts;

pub use class_counts::{
    count_label_tree, count_split_tree, render_bars, ClassCount, ClassSplitCount,
    SplitDistribution,
};
