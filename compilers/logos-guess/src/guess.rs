use logos_protocol::{
    Agent, Analysis, AnalysisId, GlossId, HighlightClass, Interpretation, WordformId, WsId,
};
use logos_store::StoreData;

/// The object a guess suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuessTarget {
    Analysis(AnalysisId),
    Gloss(GlossId),
}

impl GuessTarget {
    pub fn interpretation(self) -> Interpretation {
        match self {
            GuessTarget::Analysis(id) => Interpretation::Analysis(id),
            GuessTarget::Gloss(id) => Interpretation::Gloss(id),
        }
    }

    pub fn analysis(self, data: &StoreData) -> Option<AnalysisId> {
        data.interpretation_analysis(&self.interpretation())
    }

    pub fn exists(self, data: &StoreData) -> bool {
        match self {
            GuessTarget::Analysis(id) => data.analysis(id).is_some(),
            GuessTarget::Gloss(id) => data.gloss(id).is_some(),
        }
    }
}

/// A suggested, non-authoritative interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guess {
    pub target: GuessTarget,
    /// Who approved the suggested analysis.
    pub agent: Agent,
    pub highlight: HighlightClass,
}

/// Highest approval stamp wins; equal stamps go to the older analysis.
fn most_recent<'a>(
    analyses: &[&'a Analysis],
    agent: Agent,
) -> Option<&'a Analysis> {
    analyses
        .iter()
        .copied()
        .filter(|a| !a.is_disapproved_by_human())
        .filter_map(|a| {
            a.evaluation(agent)
                .filter(|e| e.is_approval())
                .map(|e| (e.stamp, a))
        })
        .max_by(|(s1, a1), (s2, a2)| s1.cmp(s2).then(a2.id.cmp(&a1.id)))
        .map(|(_, a)| a)
}

/// Most recently used gloss of `analysis` with text in `ws`.
pub fn best_gloss(data: &StoreData, analysis: AnalysisId, ws: WsId) -> Option<GlossId> {
    data.glosses_of(analysis)
        .into_iter()
        .filter(|g| g.form.has_text(ws))
        .max_by(|g1, g2| g1.last_used.cmp(&g2.last_used).then(g2.id.cmp(&g1.id)))
        .map(|g| g.id)
}

/// Human-approved analyses plus analyses no human has an opinion on.
pub fn relevant_analysis_count(data: &StoreData, wordform: WordformId) -> usize {
    data.analyses_of(wordform)
        .iter()
        .filter(|a| a.is_approved_by(Agent::Human) || a.human.is_none())
        .count()
}

pub fn has_multiple_relevant_analyses(data: &StoreData, wordform: WordformId) -> bool {
    relevant_analysis_count(data, wordform) > 1
}

fn highlight(data: &StoreData, wordform: WordformId, agent: Agent) -> HighlightClass {
    match agent {
        Agent::Parser => HighlightClass::MachineOnly,
        Agent::Human if has_multiple_relevant_analyses(data, wordform) => {
            HighlightClass::MultipleCandidates
        }
        Agent::Human => HighlightClass::Approved,
    }
}

/// The best existing interpretation for `wordform`: its most recently
/// human-approved analysis, else its most recently parser-approved one
/// that no human rejected. Refined to a gloss when one has text in `ws`.
pub fn compute_guess(data: &StoreData, wordform: WordformId, ws: WsId) -> Option<Guess> {
    let analyses = data.analyses_of(wordform);
    let (analysis, agent) = most_recent(&analyses, Agent::Human)
        .map(|a| (a, Agent::Human))
        .or_else(|| most_recent(&analyses, Agent::Parser).map(|a| (a, Agent::Parser)))?;

    let target = match best_gloss(data, analysis.id, ws) {
        Some(gloss) => GuessTarget::Gloss(gloss),
        None => GuessTarget::Analysis(analysis.id),
    };
    Some(Guess {
        target,
        agent,
        highlight: highlight(data, wordform, agent),
    })
}

/// Gloss-level guess for an occurrence already bound to `analysis`.
pub fn compute_gloss_guess(data: &StoreData, analysis: AnalysisId, ws: WsId) -> Option<Guess> {
    let owner = data.analysis(analysis)?;
    let agent = if owner.is_approved_by(Agent::Human) {
        Agent::Human
    } else {
        Agent::Parser
    };
    let gloss = best_gloss(data, analysis, ws)?;
    Some(Guess {
        target: GuessTarget::Gloss(gloss),
        agent,
        highlight: highlight(data, owner.owner, agent),
    })
}
