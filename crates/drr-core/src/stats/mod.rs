pub mod correlation;
pub mod descriptive;
pub mod kruskal;
pub mod rank;
pub mod significance;
pub mod spearman;
pub mod wilcoxon;

pub use correlation::{compute_correlation_matrix, CorrelationMatrix, PairRow, PairwiseResult};
pub use descriptive::{describe, quantile, Descriptives};
pub use kruskal::{kruskal_wallis, KruskalResult};
pub use rank::average_ranks;
pub use significance::{classify, SignificanceBucket};
pub use spearman::{spearman, PValueMethod, SpearmanResult};
pub use wilcoxon::{bonferroni, rank_sum, RankSumResult};
