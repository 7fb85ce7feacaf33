use crate::network::PhaseCode;

/// A directed edge crossed by a network trace.
///
/// Internal paths run between two terminals of one equipment, external paths
/// between terminals sharing a connectivity node. A start path runs from a
/// terminal to itself and counts as internal, so it expands through the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub from_terminal: String,
    pub to_terminal: String,
    /// Owner of `to_terminal`, if it has one
    pub to_equipment: Option<String>,
    /// Phases energized along this path
    pub phases: PhaseCode,
    /// AC line segment with more than two terminals this path ran through
    pub traversed_segment: Option<String>,
    pub traced_externally: bool,
}

impl Path {
    pub fn start(terminal: &str, equipment: Option<&str>, phases: PhaseCode) -> Self {
        Self {
            from_terminal: terminal.to_string(),
            to_terminal: terminal.to_string(),
            to_equipment: equipment.map(str::to_string),
            phases,
            traversed_segment: None,
            traced_externally: false,
        }
    }

    pub fn is_start(&self) -> bool {
        self.from_terminal == self.to_terminal
    }

    /// True for the first step onto an equipment: a start, or arriving from
    /// the connectivity node.
    pub fn enters_equipment(&self) -> bool {
        self.traced_externally || self.is_start()
    }

    pub fn traced_internally(&self) -> bool {
        !self.traced_externally
    }

    /// The same start terminal, facing into its own equipment
    pub fn facing_equipment(mut self) -> Self {
        self.traced_externally = true;
        self
    }
}

/// One item of a network trace: the path just crossed, step counters and a
/// value carried along the path that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTraceStep<D> {
    pub path: Path,
    pub num_terminal_steps: u32,
    /// Number of times the trace has moved onto different equipment
    pub num_equipment_steps: u32,
    pub data: D,
}

impl<D> NetworkTraceStep<D> {
    pub fn start(path: Path, data: D) -> Self {
        Self {
            path,
            num_terminal_steps: 0,
            num_equipment_steps: 0,
            data,
        }
    }

    /// The step following this one along `path`
    pub fn next(&self, path: Path, data: D) -> Self {
        let equipment_step = u32::from(path.traced_externally);
        Self {
            path,
            num_terminal_steps: self.num_terminal_steps + 1,
            num_equipment_steps: self.num_equipment_steps + equipment_step,
            data,
        }
    }
}
